//! 命令行入口
//!
//! 对保存下来的管理页面执行本地化、预览单个片段、查看词典以及管理术语统计。

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use admin_localizer::env::{core::LogLevel, EnvVar};
use admin_localizer::network::Session;
use admin_localizer::parsers::{html_to_dom, serialize_document};
use admin_localizer::translation::config::{load_localizer_config, ConfigManager};
use admin_localizer::translation::{
    load_dictionary, JsonFileStore, LocalizerConfig, LocalizerEngine, LocalizerResult,
    MemoryStore, Settings, StatsAggregator,
};

#[derive(Parser, Debug)]
#[command(name = "admin-localizer", version, about = "按术语词典把管理界面文本改写为日文")]
struct Cli {
    /// 配置文件路径（默认按搜索路径查找）
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// 术语词典位置（文件路径或 URL）
    #[arg(short, long, global = true)]
    dictionary: Option<String>,

    /// 设置与统计的存储文件
    #[arg(short, long, global = true)]
    stats: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 本地化保存下来的 HTML 页面
    Localize {
        /// 输入 HTML 文件
        input: PathBuf,
        /// 输出文件（默认写到标准输出）
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 文档编码
        #[arg(short, long, default_value = "utf-8")]
        encoding: String,
        /// 页面 URL，用于判断是否属于管理界面
        #[arg(long)]
        url: Option<String>,
    },
    /// 预览单个文本片段的改写结果
    Preview { text: String },
    /// 列出词典中的术语
    Terms,
    /// 术语统计
    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },
    /// 开启或关闭调试模式
    Debug {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Subcommand, Debug)]
enum StatsAction {
    /// 显示统计
    Show,
    /// 导出为表格文本
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 清空统计
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let level = LogLevel::get().unwrap_or_else(|e| {
        eprintln!("{}", e);
        "info".to_string()
    });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("admin_localizer={}", level)))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(cli: &Cli) -> LocalizerResult<LocalizerConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?.into_config(),
        None => load_localizer_config(),
    };

    if let Some(dictionary) = &cli.dictionary {
        config.dictionary = dictionary.clone();
    }
    if let Some(stats) = &cli.stats {
        config.stats_path = stats.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> LocalizerResult<()> {
    let config = resolve_config(&cli)?;
    let store = JsonFileStore::new(config.expanded_stats_path());

    match cli.command {
        Command::Localize {
            input,
            output,
            encoding,
            url,
        } => {
            let data = fs::read(&input)?;
            let dom = html_to_dom(&data, &encoding)?;

            let session = Session::new()?;
            let mut engine = LocalizerEngine::initialize(config, &session, store).await?;
            if let Some(url) = url {
                if !engine.set_location(&url)? {
                    tracing::warn!("{} 不属于管理界面，不做改写", url);
                }
            }

            let report = engine.localize_document(&dom.document);
            let html = serialize_document(&dom.document, &encoding)?;
            match output {
                Some(path) => fs::write(path, html)?,
                None => io::stdout().write_all(&html)?,
            }
            engine.flush_stats().await;

            eprintln!(
                "文本节点 {} 个，替换 {} 个，未匹配 {} 个，跳过容器 {} 个",
                report.visited, report.rewritten, report.unmatched, report.skipped_containers
            );
        }
        Command::Preview { text } => {
            let session = Session::new()?;
            let engine = LocalizerEngine::initialize(config, &session, MemoryStore::new()).await?;
            match engine.preview(&text) {
                Some(rewrite) => println!("{}", rewrite.text),
                None => {
                    println!("{}", text);
                    eprintln!("未匹配任何术语");
                }
            }
        }
        Command::Terms => {
            let session = Session::new()?;
            let dictionary = load_dictionary(&session, &config.dictionary).await?;
            let width = dictionary
                .iter()
                .map(|(source, _)| source.chars().count())
                .max()
                .unwrap_or(0);
            for (source, target) in dictionary.iter() {
                let pad = width - source.chars().count();
                println!("{}{}  {}", source, " ".repeat(pad), target);
            }
            eprintln!("共 {} 个术语", dictionary.len());
        }
        Command::Stats { action } => {
            let mut aggregator =
                StatsAggregator::load(&store, config.flush_debounce(), config.snippet_max_chars)
                    .await;
            match action {
                StatsAction::Show => {
                    let stats = aggregator.statistics();
                    let mut matched: Vec<_> = stats.matched().collect();
                    matched.sort_by(|a, b| b.1.match_count.cmp(&a.1.match_count));
                    for (source, stat) in matched {
                        println!("{:>6}  {} -> {}", stat.match_count, source, stat.target_term);
                    }
                    let unmatched: Vec<_> = stats.unmatched().collect();
                    if !unmatched.is_empty() {
                        println!("未匹配:");
                        for (snippet, count) in unmatched {
                            println!("{:>6}  {}", count, snippet);
                        }
                    }
                    println!("合计 {} 次匹配", stats.total_matches());
                    if let Some(updated) = stats.last_updated {
                        println!("最后更新: {}", updated.to_rfc3339());
                    }
                }
                StatsAction::Export { output } => {
                    let csv = aggregator.statistics().to_csv();
                    match output {
                        Some(path) => fs::write(path, csv)?,
                        None => print!("{}", csv),
                    }
                }
                StatsAction::Reset => {
                    aggregator.reset(&store).await?;
                    println!("统计已清空");
                }
            }
        }
        Command::Debug { state } => {
            let settings = Settings {
                debug_mode: matches!(state, Toggle::On),
            };
            settings.save(&store).await?;
            println!("调试模式: {}", if settings.debug_mode { "开启" } else { "关闭" });
        }
    }

    Ok(())
}
