//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use std::path::Path;

use assert_cmd::Command;

fn localizer(dir: &Path) -> Command {
    let dictionary = common::write_dictionary(dir);
    localizer_with(dir, &dictionary)
}

fn localizer_with(dir: &Path, dictionary: &Path) -> Command {
    let mut cmd = Command::cargo_bin("admin-localizer").unwrap();
    cmd.current_dir(dir)
        .env_remove("LOCALIZER_DICTIONARY")
        .env_remove("LOCALIZER_STATS_PATH")
        .env_remove("LOCALIZER_MATCH_POLICY")
        .arg("--dictionary")
        .arg(dictionary)
        .arg("--stats")
        .arg(dir.join("storage.json"));
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

#[cfg(test)]
mod passing {
    use super::*;

    #[test]
    fn preview_prefers_longest_term() {
        let dir = tempfile::tempdir().unwrap();
        let out = stdout_of(localizer(dir.path()).args(["preview", "Save Draft"]));
        assert_eq!(out.trim(), "下書き保存");
    }

    #[test]
    fn preview_leaves_partial_fragments() {
        let dir = tempfile::tempdir().unwrap();
        let out = stdout_of(localizer(dir.path()).args(["preview", "Publish changes"]));
        assert_eq!(out.trim(), "Publish changes");
    }

    #[test]
    fn terms_lists_valid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let out = stdout_of(localizer(dir.path()).arg("terms"));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Save "));
        assert!(lines[0].ends_with("保存"));
        assert!(!out.contains("Workspace"));
    }

    #[test]
    fn localize_writes_output_and_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("dashboard.html");
        let output = dir.path().join("dashboard.ja.html");
        std::fs::write(&input, common::ADMIN_PAGE).unwrap();

        localizer(dir.path())
            .arg("localize")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .success();

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("<button id=\"draft\">下書き保存</button>"));
        assert!(html.contains("<textarea>Save</textarea>"));

        let out = stdout_of(localizer(dir.path()).args(["stats", "export"]));
        assert!(out.starts_with("kind,source,target,count\n"));
        assert!(out.contains("matched,Save Draft,下書き保存,1"));
        assert!(out.contains("matched,\"Settings, General\",一般設定,1"));
        assert!(out.contains("unmatched,Publish changes,,1"));
    }

    #[test]
    fn localize_skips_pages_outside_admin_surface() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pricing.html");
        std::fs::write(&input, common::ADMIN_PAGE).unwrap();

        let out = stdout_of(
            localizer(dir.path())
                .arg("localize")
                .arg(&input)
                .args(["--url", "https://webflow.com/pricing"]),
        );
        assert!(out.contains("<button id=\"draft\">Save Draft</button>"));
    }

    #[test]
    fn stats_reset_clears_counts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("dashboard.html");
        std::fs::write(&input, common::ADMIN_PAGE).unwrap();
        stdout_of(localizer(dir.path()).arg("localize").arg(&input));

        let out = stdout_of(localizer(dir.path()).args(["stats", "show"]));
        assert!(out.contains("Save Draft -> 下書き保存"));

        stdout_of(localizer(dir.path()).args(["stats", "reset"]));
        let out = stdout_of(localizer(dir.path()).args(["stats", "show"]));
        assert!(out.contains("合计 0 次匹配"));
        assert!(!out.contains("下書き保存"));
    }

    #[test]
    fn debug_toggle_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        stdout_of(localizer(dir.path()).args(["debug", "on"]));

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("storage.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(raw["debugMode"], true);
    }
}

//  ███████╗ █████╗ ██╗██╗     ██╗███╗   ██╗ ██████╗
//  ██╔════╝██╔══██╗██║██║     ██║████╗  ██║██╔════╝
//  █████╗  ███████║██║██║     ██║██╔██╗ ██║██║  ███╗
//  ██╔══╝  ██╔══██║██║██║     ██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║██║███████╗██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚═╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod failing {
    use super::*;

    #[test]
    fn missing_dictionary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        localizer_with(dir.path(), &dir.path().join("missing.csv"))
            .args(["preview", "Save"])
            .assert()
            .failure();
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        localizer(dir.path())
            .args(["localize", "nope.html"])
            .assert()
            .failure();
    }
}
