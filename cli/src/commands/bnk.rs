use anyhow::{Context, Result, bail};
use bnk::SoundBank;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::parse_id;

#[derive(Subcommand)]
pub enum BnkCommands {
    /// Print header fields, record counts and load diagnostics
    Info {
        /// Input .bnk file
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Unpack a bank (Binary -> JSON + WEM extraction)
    Unpack {
        /// Input .bnk file
        input: PathBuf,
        /// Output directory (defaults to input stem)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Pack a bank from an unpacked directory
    Pack {
        /// Directory written by `bnk unpack`
        input: PathBuf,
        /// Output .bnk file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Replace an embedded WEM and fix every size that mirrors it
    Replace {
        /// Input .bnk file
        input: PathBuf,
        /// Source id of the WEM to replace
        #[arg(long, value_parser = parse_id)]
        id: u32,
        /// New WEM file
        #[arg(short, long)]
        source: PathBuf,
        /// Output .bnk file (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the media an event ends up playing
    Resolve {
        /// Input .bnk file
        input: PathBuf,
        /// Event id
        #[arg(long, value_parser = parse_id)]
        event: u32,
    },
}

pub fn handle(cmd: BnkCommands) -> Result<()> {
    match cmd {
        BnkCommands::Info { input, json } => bnk_info(&input, json),
        BnkCommands::Unpack { input, output } => bnk_unpack(&input, output),
        BnkCommands::Pack { input, output } => bnk_pack(&input, &output),
        BnkCommands::Replace {
            input,
            id,
            source,
            output,
        } => bnk_replace(&input, id, &source, output),
        BnkCommands::Resolve { input, event } => bnk_resolve(&input, event),
    }
}

const MANIFEST_NAME: &str = "bank.json";
const MEDIA_DIR: &str = "media";

/// `bank.json` in an unpacked directory. Media payloads live beside it as `<id>.wem`.
#[derive(Serialize, Deserialize)]
struct BankManifest {
    media: Vec<u32>,
    bank: SoundBank,
}

fn load(input: &Path) -> Result<SoundBank> {
    let bank = SoundBank::open(input).with_context(|| format!("Failed to load {}", input.display()))?;
    for diagnostic in &bank.diagnostics {
        warn!("{}", diagnostic);
    }
    Ok(bank)
}

#[derive(Serialize)]
struct BankSummary<'a> {
    id: u32,
    version: u32,
    language_id: u32,
    project_id: u32,
    records: usize,
    kinds: Vec<(&'static str, usize)>,
    media: usize,
    media_bytes: usize,
    chunks: Vec<String>,
    bank_names: Vec<(u32, &'a str)>,
    diagnostics: Vec<String>,
}

fn bnk_info(input: &Path, json: bool) -> Result<()> {
    let bank = load(input)?;
    let summary = BankSummary {
        id: bank.id,
        version: bank.version,
        language_id: bank.language_id,
        project_id: bank.project_id,
        records: bank.hirc.len(),
        kinds: bank.hirc.kind_counts().into_iter().collect(),
        media: bank.media.len(),
        media_bytes: bank.media.total_size(),
        chunks: bank.chunk_order.iter().map(ToString::to_string).collect(),
        bank_names: bank
            .bank_names
            .iter()
            .flatten()
            .map(|(id, name)| (*id, name.as_str()))
            .collect(),
        diagnostics: bank.diagnostics.iter().map(ToString::to_string).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("Bank {} (version {})", summary.id, summary.version);
    println!("  Language: {}", summary.language_id);
    println!("  Project: {}", summary.project_id);
    println!("  Chunks: {}", summary.chunks.join(" "));
    println!("  HIRC records: {}", summary.records);
    for (kind, count) in &summary.kinds {
        println!("    {:<24} {}", kind, count);
    }
    println!("  Embedded media: {} ({} bytes)", summary.media, summary.media_bytes);
    for (id, name) in &summary.bank_names {
        println!("  Bank name {}: {}", id, name);
    }
    if !summary.diagnostics.is_empty() {
        println!("  Diagnostics: {}", summary.diagnostics.len());
    }
    Ok(())
}

fn bnk_unpack(input: &Path, output: Option<PathBuf>) -> Result<()> {
    let bank = load(input)?;
    let out_dir = output.unwrap_or_else(|| input.with_extension(""));
    let media_dir = out_dir.join(MEDIA_DIR);
    fs::create_dir_all(&media_dir)?;

    for (id, data) in bank.media.iter() {
        fs::write(media_dir.join(format!("{}.wem", id)), data)?;
    }
    let media = bank.media.ids().collect();
    let media_count = bank.media.len();
    let manifest = BankManifest { media, bank };
    fs::write(out_dir.join(MANIFEST_NAME), serde_json::to_string_pretty(&manifest)?)?;

    info!(
        "Unpacked {} to {} ({} records, {} media)",
        input.display(),
        out_dir.display(),
        manifest.bank.hirc.len(),
        media_count
    );
    Ok(())
}

fn bnk_pack(input: &Path, output: &Path) -> Result<()> {
    let manifest_path = input.join(MANIFEST_NAME);
    let text = fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
    let BankManifest { media, mut bank } = serde_json::from_str(&text)?;

    for id in media {
        let path = input.join(MEDIA_DIR).join(format!("{}.wem", id));
        let data = fs::read(&path).with_context(|| format!("Missing media file {}", path.display()))?;
        bank.media.insert(id, data)?;
    }
    bank.save(output)?;
    info!("Packed {} ({} records, {} media)", output.display(), bank.hirc.len(), bank.media.len());
    Ok(())
}

fn bnk_replace(input: &Path, id: u32, source: &Path, output: Option<PathBuf>) -> Result<()> {
    let mut bank = load(input)?;
    let data = fs::read(source).with_context(|| format!("Failed to read {}", source.display()))?;
    let summary = patch::replace_wem(&mut bank, id, &data)?;
    if summary.is_empty() {
        bail!("Bank {} does not embed WEM {}", bank.id, id);
    }
    let out_path = output.unwrap_or_else(|| input.to_path_buf());
    bank.save(&out_path)?;
    println!(
        "Replaced WEM {} in {} ({} size fields patched)",
        id,
        out_path.display(),
        summary.references_patched
    );
    if summary.references_unchecked > 0 {
        println!("  {} raw records could not be checked for its size", summary.references_unchecked);
    }
    Ok(())
}

fn bnk_resolve(input: &Path, event: u32) -> Result<()> {
    let bank = load(input)?;
    let media = bank.resolve_event_media(event)?;
    for id in &media {
        let location = if bank.media.contains(*id) { "embedded" } else { "streamed" };
        println!("{} ({})", id, location);
    }
    info!("Event {} plays {} media", event, media.len());
    Ok(())
}
