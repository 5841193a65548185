use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use copilot_ops_core::config::Config;
use copilot_ops_core::filemap::{render, Filemap, OutputType};
use std::path::Path;

/// Build the registry from `--file` globs and `--fileset` names.
///
/// Any glob that fails to expand or any file that fails to load aborts the
/// whole request.
pub fn load(globs: &[String], filesets: &[String], config: &Config) -> Result<Filemap> {
    let mut filemap = Filemap::new();

    for glob in globs {
        log::info!("loading files from command line: {}", glob);
        load_glob(&mut filemap, glob)?;
    }

    for name in filesets {
        let fileset = config.find_fileset(name)?;
        log::info!("loading fileset {}: {:?}", fileset.name, fileset.files);
        for glob in &fileset.files {
            load_glob(&mut filemap, glob)?;
        }
    }

    Ok(filemap)
}

fn load_glob(filemap: &mut Filemap, glob: &str) -> Result<()> {
    let loaded = filemap
        .load_glob(glob)
        .with_context(|| format!("Failed to load files from '{}'", glob))?;

    if loaded.is_empty() {
        log::warn!("no files matched {}", glob);
    }
    for file in &loaded {
        log::debug!("loaded {} as tag {}", file.name, file.tag);
    }

    Ok(())
}

/// Print a summary of `filemap` to stderr.
pub fn dump(title: &str, filemap: &Filemap) {
    let mut table = new_table();
    table.add_row(prettytable::row!["TAG", "PATH", "LINES", "BYTES"]);

    for file in filemap.files() {
        let path = file
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(prettytable::row![
            file.tag,
            path,
            file.content.lines().count(),
            file.content.len()
        ]);
    }

    eprintln!("{} ({} files)", title.bold(), filemap.len());
    eprintln!("{}", table);
}

/// Write the registry to disk, or print it to stdout in the requested format.
pub fn print_or_write_out(
    filemap: &mut Filemap,
    write: bool,
    output: OutputType,
    output_dir: &Path,
) -> Result<()> {
    if write {
        filemap.assign_missing_paths(output_dir);
        let written = filemap.write_all().context("Failed to write files")?;
        log::info!("wrote {} files", written);
        return Ok(());
    }

    log::info!("use --write to actually update files");
    let rendered = render(filemap, output)?;
    println!("{}", rendered);

    Ok(())
}
