use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bio::io::fasta;
use ferrous_edit::core::alignment::chain::ChainStats;
use ferrous_edit::core::alignment::cigar;
use ferrous_edit::core::compute::encoding::ResidueAlphabet;
use ferrous_edit::defaults;
use ferrous_edit::edit_opt::{EditCliOptions, EditOpt, ReadLengthStats};
use ferrous_edit::{AlignmentRecord, EditDistanceFactory};

/// Queries handed to one worker aligner at a time.
const QUERY_CHUNK: usize = 4096;

#[derive(Parser)]
#[command(name = "ferrous-edit")]
#[command(about = "FerrousEdit - chained edit-distance alignment of reads against a template", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align candidate read placements against a template
    Align {
        /// Template FASTA file (first record is used)
        #[arg(long, value_name = "REF.FA")]
        template: PathBuf,

        /// Tab-separated candidates: read, 0-based position, strand (+/-)
        #[arg(long, value_name = "QUERIES.TSV")]
        queries: PathBuf,

        /// Score budget; alignments above it are reported as MAX
        #[arg(long, value_name = "INT", default_value_t = defaults::MAX_SCORE)]
        max_score: i32,

        /// How far an alignment may drift from the candidate position
        #[arg(short = 'w', long, value_name = "INT", default_value_t = defaults::MAX_SHIFT)]
        max_shift: i32,

        /// Prefer alignments drifting right of the candidate position on ties
        #[arg(long)]
        prefer_right: bool,

        /// Number of threads (default: all available cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,

        /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
        #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
        verbosity: i32,

        #[command(flatten)]
        edit: EditCliOptions,
    },
}

struct Candidate {
    read: Vec<u8>,
    position: i32,
    reverse: bool,
}

fn read_template(path: &Path, alphabet: ResidueAlphabet) -> Result<(String, Vec<u8>)> {
    let reader = fasta::Reader::from_file(path)
        .with_context(|| format!("opening template {}", path.display()))?;
    let Some(record) = reader.records().next() else {
        bail!("template {} has no FASTA records", path.display());
    };
    let record = record.with_context(|| format!("reading template {}", path.display()))?;
    Ok((record.id().to_string(), alphabet.encode_sequence(record.seq())))
}

fn read_candidates(
    path: &Path,
    alphabet: ResidueAlphabet,
) -> Result<(Vec<Candidate>, ReadLengthStats)> {
    let file = File::open(path).with_context(|| format!("opening queries {}", path.display()))?;
    let mut candidates = Vec::new();
    let mut lengths = ReadLengthStats::default();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(read), Some(position)) = (fields.next(), fields.next()) else {
            bail!("{}:{}: expected read<TAB>position[<TAB>strand]", path.display(), lineno + 1);
        };
        let position: i32 = position
            .parse()
            .with_context(|| format!("{}:{}: bad position '{}'", path.display(), lineno + 1, position))?;
        let reverse = match fields.next() {
            None | Some("+") => false,
            Some("-") => true,
            Some(other) => bail!("{}:{}: bad strand '{}'", path.display(), lineno + 1, other),
        };
        lengths.observe(read.len());
        candidates.push(Candidate {
            read: alphabet.encode_sequence(read.as_bytes()),
            position,
            reverse,
        });
    }
    Ok((candidates, lengths))
}

fn format_record(record: &AlignmentRecord, template: &[u8], alphabet: ResidueAlphabet) -> String {
    if record.is_sentinel() {
        return format!("MAX\t{}\t*", record.template_start());
    }
    let ops = cigar::sam_cigar_ops(record.actions());
    if alphabet == ResidueAlphabet::Protein {
        return format!(
            "{}\t{}\t{}\tNM:i:{}",
            record.score(),
            record.template_start(),
            cigar::to_string(&ops),
            cigar::compute_nm_only(record)
        );
    }
    let (nm, md) = cigar::compute_nm_and_md(record, template);
    format!(
        "{}\t{}\t{}\tNM:i:{}\tMD:Z:{}",
        record.score(),
        record.template_start(),
        cigar::to_string(&ops),
        nm,
        md
    )
}

#[allow(clippy::too_many_arguments)]
fn run_align(
    template_path: &Path,
    queries_path: &Path,
    max_score: i32,
    max_shift: i32,
    prefer_right: bool,
    threads: Option<usize>,
    mut opt: EditOpt,
) -> Result<()> {
    let (name, template) = read_template(template_path, opt.data_type)?;
    log::info!("Template {}: {} residues", name, template.len());

    let (candidates, lengths) = read_candidates(queries_path, opt.data_type)?;
    log::info!(
        "{} candidates, read lengths {}..={}",
        candidates.len(),
        lengths.min,
        lengths.max
    );
    opt.read_length = lengths;
    if opt.data_type == ResidueAlphabet::Protein && candidates.iter().any(|c| c.reverse) {
        bail!("protein queries have no reverse strand");
    }

    let alphabet = opt.data_type;
    let factory = EditDistanceFactory::new(opt)?;
    let template: Arc<[u8]> = template.into();

    let num_threads = threads.unwrap_or_else(num_cpus::get).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("building thread pool")?;
    log::info!("Using {} threads", num_threads);

    let results: Vec<(Vec<String>, ChainStats, ChainStats)> = pool.install(|| {
        candidates
            .par_chunks(QUERY_CHUNK)
            .map(|chunk| {
                let mut aligner = factory.build();
                aligner.set_template(Arc::clone(&template));
                let lines: Vec<String> = chunk
                    .iter()
                    .map(|c| {
                        let record = aligner.calculate_edit_distance(
                            &c.read,
                            c.read.len(),
                            c.position,
                            c.reverse,
                            max_score,
                            max_shift,
                            prefer_right,
                        );
                        format_record(&record, &template, alphabet)
                    })
                    .collect();
                let forward = aligner.forward_stats().cloned().unwrap_or_default();
                let reverse = aligner.reverse_stats().cloned().unwrap_or_default();
                (lines, forward, reverse)
            })
            .collect()
    });

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut forward = ChainStats::default();
    let mut reverse = ChainStats::default();
    for (lines, fwd, rev) in &results {
        for line in lines {
            writeln!(out, "{}", line).context("writing results")?;
        }
        forward.merge(fwd);
        reverse.merge(rev);
    }
    out.flush().context("writing results")?;

    forward.log_report("forward");
    if reverse.total_calls() > 0 {
        reverse.log_report("reverse");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Align {
            template,
            queries,
            max_score,
            max_shift,
            prefer_right,
            threads,
            verbosity,
            edit,
        } => {
            // Map verbosity (1=error, 2=warning, 3=message, 4=debug, 5+=trace)
            let log_level = match verbosity {
                v if v <= 1 => log::LevelFilter::Error,
                2 => log::LevelFilter::Warn,
                3 => log::LevelFilter::Info,
                4 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            };
            env_logger::Builder::from_default_env()
                .filter_level(log_level)
                .format_timestamp(None)
                .format_target(false)
                .init();

            if max_shift < 0 {
                log::error!("max shift must be >= 0, got {}", max_shift);
                std::process::exit(1);
            }

            let opt = edit.into_opt();
            if let Err(e) = run_align(
                &template,
                &queries,
                max_score,
                max_shift,
                prefer_right,
                threads,
                opt,
            ) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }
}
