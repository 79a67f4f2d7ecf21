use kodi_repo_builder::create_repository;
use kodi_repo_builder::error::RepoError;
use mockito::Server;
use std::fs;
use tempfile::TempDir;

mod common;
use common::*;

#[tokio::test]
async fn test_fetches_branch_archive() {
    setup_test_logger();
    let mut server = Server::new_async().await;
    let sources = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();

    let addon = write_addon(sources.path(), "checkout", "script.remote", "3.0.0");
    let mock = server
        .mock("GET", "/me/script.remote/archive/master.zip")
        .with_status(200)
        .with_header("content-type", "application/zip")
        .with_body(zip_bytes(&addon, "script.remote-master"))
        .create_async()
        .await;

    let location = format!("{}/me/script.remote", server.url());
    let summary = create_repository(&[location], &test_config(repo.path()), None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(summary.addons[0].id, "script.remote");
    let names = archive_names(&repo.path().join("script.remote/script.remote-3.0.0.zip"));
    assert!(names.contains(&"script.remote/addon.xml".to_string()));
    assert!(names.contains(&"script.remote/resources/lib/main.py".to_string()));
    assert!(!repo.path().join("temp").exists());
}

#[tokio::test]
async fn test_rebrands_alternate_variant() {
    let mut server = Server::new_async().await;
    let sources = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();

    let addon = write_addon(sources.path(), "checkout", "script.remote", "3.1.0");
    let mock = server
        .mock("GET", "/me/script.remote/archive/beta.zip")
        .with_status(200)
        .with_body(zip_bytes(&addon, "script.remote-beta"))
        .create_async()
        .await;

    let location = format!(
        "{}/me/script.remote#beta#script.remote.beta#Remote BETA",
        server.url()
    );
    let summary = create_repository(&[location], &test_config(repo.path()), None)
        .await
        .unwrap();

    mock.assert_async().await;
    let metadata = &summary.addons[0];
    assert_eq!(metadata.id, "script.remote.beta");
    assert_eq!(metadata.name().as_deref(), Some("Remote BETA"));

    let addon_dir = repo.path().join("script.remote.beta");
    let names = archive_names(&addon_dir.join("script.remote.beta-3.1.0.zip"));
    assert!(names.contains(&"script.remote.beta/addon.xml".to_string()));
    let packaged = fs::read_to_string(addon_dir.join("addon.xml")).unwrap();
    assert!(packaged.contains(r#"id="script.remote.beta" name="Remote BETA""#));

    let manifest = fs::read_to_string(repo.path().join("addons.xml")).unwrap();
    assert!(manifest.contains(r#"id="script.remote.beta""#));
}

#[tokio::test]
async fn test_download_failure_aborts_run() {
    let mut server = Server::new_async().await;
    let repo = TempDir::new().unwrap();
    let _mock = server
        .mock("GET", "/me/script.gone/archive/master.zip")
        .with_status(404)
        .create_async()
        .await;

    let location = format!("{}/me/script.gone", server.url());
    let err = create_repository(&[location.clone()], &test_config(repo.path()), None)
        .await
        .unwrap_err();

    match &err {
        RepoError::Addon { location: failed, source } => {
            assert_eq!(failed, &location);
            assert!(matches!(**source, RepoError::Download(_)));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!repo.path().join("addons.xml").exists());
}

#[tokio::test]
async fn test_branch_archive_with_two_roots_is_rejected() {
    let mut server = Server::new_async().await;
    let repo = TempDir::new().unwrap();

    let mut bytes = Vec::new();
    {
        use std::io::Write;
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut bytes));
        let options = zip::write::FileOptions::default();
        zip.start_file("script.split-master/addon.xml", options).unwrap();
        zip.write_all(addon_xml("script.split", "1.0.0", "Split").as_bytes()).unwrap();
        zip.start_file("extras/readme.txt", options).unwrap();
        zip.write_all(b"stray").unwrap();
        zip.finish().unwrap();
    }
    let mock = server
        .mock("GET", "/me/script.split/archive/master.zip")
        .with_status(200)
        .with_body(bytes)
        .create_async()
        .await;

    let location = format!("{}/me/script.split", server.url());
    let err = create_repository(&[location], &test_config(repo.path()), None)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err.root_cause(), RepoError::ArchiveLayout(_)));
    assert!(!repo.path().join("script.split").exists());
    assert!(!repo.path().join("addons.xml").exists());
}

#[tokio::test]
async fn test_default_branch_from_config() {
    let mut server = Server::new_async().await;
    let sources = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();

    let addon = write_addon(sources.path(), "checkout", "script.main", "1.0.0");
    let mock = server
        .mock("GET", "/me/script.main/archive/main.zip")
        .with_status(200)
        .with_body(zip_bytes(&addon, "script.main-main"))
        .create_async()
        .await;

    let mut config = test_config(repo.path());
    config.default_branch = "main".to_string();
    create_repository(&[format!("{}/me/script.main", server.url())], &config, None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(repo.path().join("script.main/script.main-1.0.0.zip").is_file());
}
