#![allow(dead_code)]

use kodi_repo_builder::config::Config;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

pub fn addon_xml(id: &str, version: &str, name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<addon id="{}" name="{}" version="{}" provider-name="tests">
    <requires>
        <import addon="xbmc.python" version="2.25.0"/>
    </requires>
    <extension point="xbmc.python.script" library="default.py"/>
    <extension point="xbmc.addon.metadata">
        <summary lang="en">Test add-on</summary>
    </extension>
</addon>
"#,
        id, name, version
    )
}

/// Creates `{parent}/{dirname}` holding a small add-on
pub fn write_addon(parent: &Path, dirname: &str, id: &str, version: &str) -> PathBuf {
    let dir = parent.join(dirname);
    fs::create_dir_all(dir.join("resources/lib")).unwrap();
    fs::write(dir.join("addon.xml"), addon_xml(id, version, "Sample")).unwrap();
    fs::write(dir.join("icon.png"), b"\x89PNG fake").unwrap();
    fs::write(dir.join("changelog.txt"), format!("v{}\n- things", version)).unwrap();
    fs::write(dir.join("default.py"), "import resources.lib.main\n").unwrap();
    fs::write(dir.join("resources/lib/main.py"), "print('hello')\n").unwrap();
    dir
}

/// Zips every file of `source` under the entry prefix `root/`
pub fn zip_bytes(source: &Path, root: &str) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options = FileOptions::default();
        zip.add_directory(format!("{}/", root), options).unwrap();
        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry.unwrap();
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(source).unwrap();
            let name = format!("{}/{}", root, relative.to_string_lossy().replace('\\', "/"));
            zip.start_file(name, options).unwrap();
            zip.write_all(&fs::read(entry.path()).unwrap()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf.into_inner()
}

pub fn write_zip(source: &Path, root: &str, dest: &Path) -> PathBuf {
    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    fs::write(dest, zip_bytes(source, root)).unwrap();
    dest.to_path_buf()
}

pub fn archive_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

pub fn test_config(datadir: &Path) -> Config {
    let mut config = Config::new(datadir.to_path_buf());
    config.addons_list = datadir.join("no-such-list.txt");
    config
}

pub fn location(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

pub fn setup_test_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}
