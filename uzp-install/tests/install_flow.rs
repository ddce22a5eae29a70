use mockito::{Matcher, Server, ServerGuard};
use std::fs;
use tempfile::{tempdir, TempDir};
use uzp_install::{
    Action, InstallError, Installer, InstallerConfig, LinkOutcome, Origin, Outcome, Platform,
    TargetSpec,
};

const REPO: &str = "hungnguyen18/uzp-cli";

fn config(dir: &TempDir, server: &ServerGuard) -> InstallerConfig {
    InstallerConfig {
        repo: REPO.to_string(),
        binary: "uzp".to_string(),
        api_base: server.url(),
        github_token: None,
        install_dir: dir.path().join("pkg").join("bin"),
        cache_dir: dir.path().join(".uzp-cache"),
        link_dir: Some(dir.path().join("global-bin")),
        link: true,
    }
}

fn release_body(server: &ServerGuard, tag: &str, assets: &[&str]) -> String {
    let assets: Vec<serde_json::Value> = assets
        .iter()
        .map(|name| {
            serde_json::json!({
                "name": name,
                "browser_download_url": format!("{}/download/{tag}/{name}", server.url()),
                "size": 10 * 1024 * 1024,
            })
        })
        .collect();
    serde_json::json!({ "tag_name": tag, "assets": assets }).to_string()
}

fn target(os: &str, arch: &str, requested: Option<&str>) -> TargetSpec {
    TargetSpec {
        platform: Platform::detect(os, arch).expect("platform"),
        requested: requested.map(str::to_string),
    }
}

fn install(
    installer: &Installer<uzp_install::GithubReleases, uzp_install::HttpFetcher>,
    target: &TargetSpec,
) -> Result<Outcome, InstallError> {
    installer.run(target, &mut |_| {})
}

#[test]
fn fresh_install_downloads_caches_and_links() {
    let mut server = Server::new();
    let dir = tempdir().expect("tempdir");
    let body = release_body(&server, "v2.0.0", &["uzp-linux-amd64", "uzp-darwin-arm64"]);

    let latest = server
        .mock("GET", "/repos/hungnguyen18/uzp-cli/releases/latest")
        .match_header("user-agent", "uzp-npm-installer")
        .with_status(200)
        .with_body(body)
        .expect(1)
        .create();
    let download = server
        .mock("GET", "/download/v2.0.0/uzp-linux-amd64")
        .with_status(200)
        .with_body(vec![42u8; 256 * 1024])
        .expect(1)
        .create();

    let config = config(&dir, &server);
    let installer = Installer::from_config(config.clone());
    let outcome = install(&installer, &target("linux", "x86_64", None)).expect("install");

    latest.assert();
    download.assert();

    let Outcome::Installed(report) = outcome else {
        panic!("expected a fresh install");
    };
    assert_eq!(report.action, Action::Install);
    assert_eq!(report.origin, Origin::Download);
    assert_eq!(report.binary_path, config.install_dir.join("uzp"));
    assert_eq!(fs::read(&report.binary_path).expect("binary"), vec![42u8; 256 * 1024]);

    let entry = config.cache_dir.join("uzp-linux-amd64-v2.0.0");
    assert_eq!(fs::read(&entry).expect("cache entry"), vec![42u8; 256 * 1024]);
    assert_eq!(
        fs::read_to_string(config.cache_dir.join("version.txt")).expect("marker"),
        "2.0.0"
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&report.binary_path)
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);

        let link = dir.path().join("global-bin").join("uzp");
        assert_eq!(report.link, LinkOutcome::Linked(link.clone()));
        assert_eq!(fs::read_link(&link).expect("symlink"), report.binary_path);
    }
}

#[test]
fn latest_already_current_skips_download() {
    let mut server = Server::new();
    let dir = tempdir().expect("tempdir");
    let body = release_body(&server, "v2.0.0", &["uzp-linux-amd64"]);

    let latest = server
        .mock("GET", "/repos/hungnguyen18/uzp-cli/releases/latest")
        .with_status(200)
        .with_body(body)
        .expect(2)
        .create();
    let download = server
        .mock("GET", "/download/v2.0.0/uzp-linux-amd64")
        .with_status(200)
        .with_body("uzp 2.0.0")
        .expect(1)
        .create();

    let installer = Installer::from_config(config(&dir, &server));
    let target = target("linux", "x86_64", None);
    install(&installer, &target).expect("first install");
    let outcome = install(&installer, &target).expect("second run");

    latest.assert();
    download.assert();
    assert!(matches!(
        outcome,
        Outcome::UpToDate { ref version, .. } if version == "v2.0.0"
    ));
}

#[test]
fn cached_version_request_installs_without_download() {
    let mut server = Server::new();
    let dir = tempdir().expect("tempdir");
    let config = config(&dir, &server);

    fs::create_dir_all(&config.cache_dir).expect("cache dir");
    fs::write(config.cache_dir.join("uzp-darwin-arm64-v1.0.6"), b"uzp 1.0.6").expect("entry");
    fs::create_dir_all(&config.install_dir).expect("install dir");
    fs::write(config.install_dir.join("uzp"), b"uzp 2.0.0").expect("existing");
    fs::write(config.cache_dir.join("version.txt"), "2.0.0").expect("marker");

    let body = release_body(&server, "v1.0.6", &["uzp-darwin-arm64"]);
    let by_tag = server
        .mock("GET", "/repos/hungnguyen18/uzp-cli/releases/tags/v1.0.6")
        .with_status(200)
        .with_body(body)
        .expect(1)
        .create();
    let downloads = server
        .mock("GET", Matcher::Regex(r"^/download/".to_string()))
        .expect(0)
        .create();

    let installer = Installer::from_config(config.clone());
    let outcome =
        install(&installer, &target("macos", "aarch64", Some("1.0.6"))).expect("install");

    by_tag.assert();
    downloads.assert();

    let Outcome::Installed(report) = outcome else {
        panic!("expected an install");
    };
    assert!(matches!(report.action, Action::Override { .. }));
    assert_eq!(report.origin, Origin::Cache);
    assert_eq!(fs::read(&report.binary_path).expect("binary"), b"uzp 1.0.6");
    assert_eq!(
        fs::read_to_string(config.cache_dir.join("version.txt")).expect("marker"),
        "1.0.6"
    );
}

#[test]
fn version_marker_tracks_the_binary_in_place() {
    let mut server = Server::new();
    let dir = tempdir().expect("tempdir");
    let config = config(&dir, &server);

    server
        .mock("GET", "/repos/hungnguyen18/uzp-cli/releases/latest")
        .with_status(200)
        .with_body(release_body(&server, "v2.0.0", &["uzp-linux-amd64"]))
        .create();
    server
        .mock("GET", "/repos/hungnguyen18/uzp-cli/releases/tags/v1.0.6")
        .with_status(200)
        .with_body(release_body(&server, "v1.0.6", &["uzp-linux-amd64"]))
        .create();
    server
        .mock("GET", "/download/v2.0.0/uzp-linux-amd64")
        .with_status(200)
        .with_body("uzp 2.0.0")
        .expect(1)
        .create();
    server
        .mock("GET", "/download/v1.0.6/uzp-linux-amd64")
        .with_status(200)
        .with_body("uzp 1.0.6")
        .expect(1)
        .create();

    let installer = Installer::from_config(config.clone());
    let binary = config.install_dir.join("uzp");
    let marker = || fs::read_to_string(config.cache_dir.join("version.txt")).expect("marker");

    install(&installer, &target("linux", "x86_64", None)).expect("latest");
    assert_eq!(marker(), "2.0.0");

    install(&installer, &target("linux", "x86_64", Some("1.0.6"))).expect("pin");
    assert_eq!(marker(), "1.0.6");
    assert_eq!(fs::read_to_string(&binary).expect("binary"), "uzp 1.0.6");

    // Back to latest: the marker says 1.0.6, so this is an update served from cache.
    let outcome = install(&installer, &target("linux", "x86_64", None)).expect("update");
    let Outcome::Installed(report) = outcome else {
        panic!("expected an update");
    };
    assert!(matches!(report.action, Action::Update { .. }));
    assert_eq!(report.origin, Origin::Cache);
    assert_eq!(marker(), "2.0.0");
    assert_eq!(fs::read_to_string(&binary).expect("binary"), "uzp 2.0.0");
}

#[test]
fn failed_download_leaves_no_artifacts() {
    let mut server = Server::new();
    let dir = tempdir().expect("tempdir");
    let config = config(&dir, &server);

    server
        .mock("GET", "/repos/hungnguyen18/uzp-cli/releases/latest")
        .with_status(200)
        .with_body(release_body(&server, "v2.0.0", &["uzp-linux-amd64"]))
        .create();
    server
        .mock("GET", "/download/v2.0.0/uzp-linux-amd64")
        .with_status(301)
        .with_header("location", "/mirror/uzp-linux-amd64")
        .create();
    server
        .mock("GET", "/mirror/uzp-linux-amd64")
        .with_status(404)
        .create();

    let installer = Installer::from_config(config.clone());
    let err = install(&installer, &target("linux", "x86_64", None)).expect_err("http error");

    assert!(matches!(err, InstallError::HttpError { status: 404, .. }));
    assert!(!config.install_dir.join("uzp").exists());
    assert!(!config.cache_dir.join("uzp-linux-amd64-v2.0.0").exists());
    assert!(!config.cache_dir.join("version.txt").exists());
}

#[test]
fn missing_platform_asset_is_reported() {
    let mut server = Server::new();
    let dir = tempdir().expect("tempdir");

    server
        .mock("GET", "/repos/hungnguyen18/uzp-cli/releases/latest")
        .with_status(200)
        .with_body(release_body(&server, "v2.0.0", &["uzp-linux-amd64"]))
        .create();

    let installer = Installer::from_config(config(&dir, &server));
    let err = install(&installer, &target("windows", "aarch64", None)).expect_err("no asset");

    match err {
        InstallError::AssetNotFoundForPlatform { asset, available } => {
            assert_eq!(asset, "uzp-windows-arm64.exe");
            assert_eq!(available, vec!["uzp-linux-amd64"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
