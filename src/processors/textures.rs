use crate::error::{RepoError, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;
use std::process::Command;

const MEDIA_DIR: &str = "media";
const THEMES_DIR: &str = "themes";

/// True when a skin folder carries a `media/` directory to pack
pub fn has_media(skin_dir: &Path) -> bool {
    skin_dir.join(MEDIA_DIR).is_dir()
}

/// Packs a skin's textures into `.xbt` bundles with TexturePacker.
///
/// `media/` becomes the `Textures` theme; every directory under `themes/` is
/// packed into `media/{theme}.xbt`, then `themes/` is removed. Operates in
/// place on `skin_dir`.
pub fn pack_skin_textures(skin_dir: &Path, packer: &Path) -> Result<()> {
    let media_dir = skin_dir.join(MEDIA_DIR);
    if !media_dir.is_dir() {
        return Ok(());
    }

    let themes_dir = skin_dir.join(THEMES_DIR);
    fs::create_dir_all(&themes_dir)?;
    fs::rename(&media_dir, themes_dir.join("Textures"))?;
    fs::create_dir_all(&media_dir)?;

    let mut themes: Vec<_> = fs::read_dir(&themes_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name())
        .collect();
    themes.sort();

    for theme in themes {
        let input = themes_dir.join(&theme);
        let output = media_dir.join(format!("{}.xbt", theme.to_string_lossy()));
        run_packer(packer, &input, &output)?;
    }

    fs::remove_dir_all(&themes_dir)?;
    info!("Packed textures for {}", skin_dir.display());
    Ok(())
}

fn run_packer(packer: &Path, input: &Path, output: &Path) -> Result<()> {
    debug!("{} -dupecheck -input {} -output {}", packer.display(), input.display(), output.display());
    let status = Command::new(packer)
        .arg("-dupecheck")
        .arg("-input")
        .arg(input)
        .arg("-output")
        .arg(output)
        .status()
        .map_err(|e| RepoError::TexturePacker(format!("Cannot run {}: {}", packer.display(), e)))?;

    if !status.success() {
        return Err(RepoError::TexturePacker(format!(
            "{} failed for {} ({})",
            packer.display(),
            input.display(),
            status
        )));
    }
    Ok(())
}
