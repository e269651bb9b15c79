//! AEDAT 3.1 decoder CLI application.
//!
//! Decodes Dynap-se recordings written by cAER to various output formats.

use aedat3_core::{decoder, output, FieldOrder, SpecialKind};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

/// AEDAT 3.1 file decoder for Dynap-se neuromorphic processors.
///
/// Decodes .aedat files in AEDAT 3.1 format to human-readable CSV or an
/// efficient binary format.
#[derive(Parser, Debug)]
#[command(name = "aedat3-decode")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input AEDAT 3.1 file path
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (.csv, .bin)
    ///
    /// The output format is determined by the file extension:
    /// - .csv: Comma-separated values (human-readable)
    /// - .bin: Binary format (efficient, for programmatic access)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Field order for CSV output.
    ///
    /// Specify the order of fields in the output CSV.
    /// Format: comma-separated field names (core, chip, neuron, t)
    ///
    /// Examples:
    /// - "core,chip,neuron,t" (default)
    /// - "t,core,chip,neuron" (timestamp first)
    #[arg(short, long, default_value = "core,chip,neuron,t")]
    format: String,

    /// Keep only spikes from this core ID (0-3 on Dynap-se)
    #[arg(short, long, value_name = "ID")]
    core: Option<u8>,

    /// Output file for special events (optional)
    ///
    /// If provided, special events (timestamp wraps, external input edges)
    /// will be written to this file as CSV.
    #[arg(short, long, value_name = "PATH")]
    special: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Parse field order
    let field_order = FieldOrder::from_str(&args.format)
        .context("Invalid field format. Use comma-separated: core,chip,neuron,t")?;

    // Setup progress bar
    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb.set_message("Decoding...");
        pb
    };

    let start_time = Instant::now();

    // Decode the file
    progress.set_message(format!(
        "Decoding {:?}...",
        args.input.file_name().unwrap_or_default()
    ));

    let result = decoder::decode_file(&args.input).context("Failed to decode AEDAT file")?;

    let decode_duration = start_time.elapsed();
    let decoded_spikes = result.polarity_events.len();

    // Apply the core filter, if any
    let spikes = match args.core {
        Some(core_id) => result
            .polarity_events
            .into_iter()
            .filter(|e| e.core_id == core_id)
            .collect(),
        None => result.polarity_events,
    };

    if !args.quiet {
        progress.set_message(format!(
            "Decoded {} spike events, {} special events in {:.2}s",
            decoded_spikes,
            result.special_events.len(),
            decode_duration.as_secs_f64()
        ));
    }

    // Determine output format from extension
    let output_ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv");

    progress.set_message(format!(
        "Writing to {:?}...",
        args.output.file_name().unwrap_or_default()
    ));

    match output_ext.to_lowercase().as_str() {
        "csv" => {
            output::write_csv(&args.output, &spikes, field_order)
                .context("Failed to write CSV output")?;
        }
        "bin" => {
            output::write_binary(&args.output, &spikes)
                .context("Failed to write binary output")?;
        }
        _ => {
            anyhow::bail!(
                "Unsupported output format: .{}. Use .csv or .bin",
                output_ext
            );
        }
    }

    // Write special events if requested
    if let Some(special_path) = &args.special {
        if !result.special_events.is_empty() {
            output::write_special_csv(special_path, &result.special_events)
                .context("Failed to write special event CSV")?;

            if !args.quiet {
                progress.set_message(format!(
                    "Wrote {} special events to {:?}",
                    result.special_events.len(),
                    special_path.file_name().unwrap_or_default()
                ));
            }
        }
    }

    let total_duration = start_time.elapsed();

    progress.finish_with_message(format!(
        "Done! Wrote {} spike events in {:.2}s",
        spikes.len(),
        total_duration.as_secs_f64()
    ));

    if !args.quiet {
        let timestamp_wraps = result
            .special_events
            .iter()
            .filter(|e| e.kind() == Some(SpecialKind::TimestampWrap))
            .count();
        let events_per_sec = decoded_spikes as f64 / total_duration.as_secs_f64();

        // Print summary
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:           {:?}", args.input);
        eprintln!("  Output:          {:?}", args.output);
        eprintln!("  Spike events:    {}", decoded_spikes);
        if args.core.is_some() {
            eprintln!("  After filter:    {}", spikes.len());
        }
        eprintln!("  Special events:  {}", result.special_events.len());
        eprintln!("  Timestamp wraps: {}", timestamp_wraps);
        eprintln!("  Skipped packets: {}", result.unrecognized_packets);
        eprintln!("  Duration:        {:.3}s", total_duration.as_secs_f64());
        eprintln!("  Throughput:      {:.0} events/s", events_per_sec);
    }

    Ok(())
}
