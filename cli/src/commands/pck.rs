use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use patch::PackageEditor;
use pck::{EntryInfo, FileLut, LutKey, PckPackage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::parse_id;

#[derive(Subcommand)]
pub enum PckCommands {
    /// List languages and every table entry
    Info {
        /// Input .pck file
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract every entry to <table>/<language>/<id>.<ext>
    Extract {
        /// Input .pck file
        input: PathBuf,
        /// Output directory (defaults to input stem)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace a WEM or a whole sound bank and write a new package
    Replace {
        /// Input .pck file
        input: PathBuf,
        /// What the id refers to
        #[arg(long, value_enum)]
        kind: ReplaceKind,
        /// WEM source id or sound bank id
        #[arg(long, value_parser = parse_id)]
        id: u32,
        /// Replacement file
        #[arg(short, long)]
        source: PathBuf,
        /// Output .pck file (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReplaceKind {
    Wem,
    Bnk,
}

pub fn handle(cmd: PckCommands) -> Result<()> {
    match cmd {
        PckCommands::Info { input, json } => pck_info(&input, json),
        PckCommands::Extract { input, output } => pck_extract(&input, output),
        PckCommands::Replace {
            input,
            kind,
            id,
            source,
            output,
        } => pck_replace(&input, kind, id, &source, output),
    }
}

fn open(input: &Path) -> Result<PckPackage> {
    PckPackage::open(input).with_context(|| format!("Failed to load {}", input.display()))
}

fn print_table(package: &PckPackage, name: &str, entries: &[EntryInfo]) {
    println!("  {}: {}", name, entries.len());
    for entry in entries {
        let language = package.language_name(entry.language_id).unwrap_or("?");
        let size = entry.size.map_or_else(|| "?".to_string(), |s| s.to_string());
        println!(
            "    {:>20}  {:<12} {:>10} bytes @ {:#010x}",
            entry.id, language, size, entry.start_block
        );
    }
}

fn pck_info(input: &Path, json: bool) -> Result<()> {
    let package = open(input)?;
    let info = package.info();
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    println!("Package {}", input.display());
    println!("  Languages:");
    for language in &info.languages {
        println!("    {:>4}  {}", language.id, language.name);
    }
    print_table(&package, pck::SOUND_BANKS, &info.sound_banks);
    print_table(&package, pck::STREAMING_FILES, &info.streaming_files);
    print_table(&package, pck::EXTERNAL_FILES, &info.external_files);
    Ok(())
}

fn extract_table<K: LutKey>(
    lut: &mut FileLut<K>,
    languages: &pck::StringMap,
    out_dir: &Path,
    ext: &str,
) -> Result<usize> {
    let table = lut.name();
    let mut count = 0;
    for entry in lut.iter_mut() {
        let language = languages
            .get(entry.language_id)
            .map_or_else(|| entry.language_id.to_string(), str::to_string);
        let dir = out_dir.join(table).join(language);
        fs::create_dir_all(&dir)?;
        let id: u64 = entry.id.into();
        let data = entry.data()?;
        fs::write(dir.join(format!("{}.{}", id, ext)), data)?;
        count += 1;
    }
    Ok(count)
}

fn pck_extract(input: &Path, output: Option<PathBuf>) -> Result<()> {
    let mut package = open(input)?;
    let out_dir = output.unwrap_or_else(|| input.with_extension(""));
    let languages = package.languages.clone();

    let banks = extract_table(&mut package.sound_banks, &languages, &out_dir, "bnk")?;
    let streaming = extract_table(&mut package.streaming_files, &languages, &out_dir, "wem")?;
    let external = extract_table(&mut package.external_files, &languages, &out_dir, "wem")?;

    info!(
        "Extracted {} banks, {} streaming files and {} external files to {}",
        banks,
        streaming,
        external,
        out_dir.display()
    );
    Ok(())
}

fn pck_replace(input: &Path, kind: ReplaceKind, id: u32, source: &Path, output: Option<PathBuf>) -> Result<()> {
    let data = fs::read(source).with_context(|| format!("Failed to read {}", source.display()))?;
    let mut editor = PackageEditor::open(input).with_context(|| format!("Failed to load {}", input.display()))?;

    match kind {
        ReplaceKind::Wem => {
            let summary = editor.replace_wem(id, &data)?;
            if summary.is_empty() {
                bail!("WEM {} is neither streamed nor embedded in {}", id, input.display());
            }
            println!(
                "Replaced WEM {}: streaming {}, {} banks, {} size fields patched",
                id,
                if summary.streaming_replaced { "yes" } else { "no" },
                summary.banks_modified,
                summary.references_patched
            );
            if summary.references_unchecked > 0 {
                println!("  {} raw records could not be checked for its size", summary.references_unchecked);
            }
        }
        ReplaceKind::Bnk => {
            let replaced = editor.replace_bnk(id, &data);
            if replaced == 0 {
                bail!("Sound bank {} is not in {}", id, input.display());
            }
            println!("Replaced {} entries of sound bank {}", replaced, id);
        }
    }

    let out_path = output.unwrap_or_else(|| input.to_path_buf());
    editor.save(&out_path)?;
    info!("Wrote {}", out_path.display());
    Ok(())
}
