//! Command implementations for the skills-utils CLI.

use std::sync::Arc;

use log::debug;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::Result;
use crate::io::stream_json_file;
use crate::iteration::Batch;
use crate::storage::file::FileObjectStoreConfig;
use crate::storage::transfer::{download, list_files, upload};
use crate::storage::{ObjectStore, ObjectStoreConfig, ObjectStoreFactory};
use crate::time::{Quarter, dates_in_range, datetime_to_quarter};

/// Execute a CLI command.
pub fn execute_command(args: SkillsArgs) -> Result<()> {
    match &args.command {
        Command::Quarter(quarter_args) => show_quarter(quarter_args, &args),
        Command::QuarterOf(quarter_of_args) => show_quarter_of(quarter_of_args, &args),
        Command::Dates(dates_args) => show_dates(dates_args, &args),
        Command::Upload(upload_args) => upload_file(upload_args, &args),
        Command::Download(download_args) => download_file(download_args, &args),
        Command::List(list_args) => list_prefix(list_args, &args),
        Command::CheckJsonl(check_args) => check_jsonl(check_args, &args),
    }
}

/// Open the file-backed object store the CLI works against.
fn open_store(cli_args: &SkillsArgs) -> Result<Arc<dyn ObjectStore>> {
    debug!("opening object store at {}", cli_args.store_root.display());
    let mut config = FileObjectStoreConfig::new(&cli_args.store_root);
    config.auto_create_buckets = cli_args.create_buckets;
    ObjectStoreFactory::create(ObjectStoreConfig::File(config))
}

fn show_quarter(args: &QuarterArgs, cli_args: &SkillsArgs) -> Result<()> {
    let quarter: Quarter = args.quarter.parse()?;
    let (start, end) = quarter.date_range()?;

    output_result(
        &format!("Date range of {quarter}"),
        &QuarterRangeResult {
            quarter: quarter.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        },
        cli_args,
    )
}

fn show_quarter_of(args: &QuarterOfArgs, cli_args: &SkillsArgs) -> Result<()> {
    output_result(
        &format!("Quarter of {}", args.date),
        &QuarterOfResult {
            date: args.date.to_string(),
            quarter: datetime_to_quarter(&args.date)?,
        },
        cli_args,
    )
}

fn show_dates(args: &DatesArgs, cli_args: &SkillsArgs) -> Result<()> {
    let dates: Vec<String> = dates_in_range(args.start, args.end)
        .iter()
        .map(ToString::to_string)
        .collect();

    output_result(
        &format!("Dates from {} up to {}", args.start, args.end),
        &DatesResult {
            count: dates.len(),
            dates,
        },
        cli_args,
    )
}

fn upload_file(args: &UploadArgs, cli_args: &SkillsArgs) -> Result<()> {
    let store = open_store(cli_args)?;
    let bytes = std::fs::metadata(&args.file)?.len();
    let destination = upload(store.as_ref(), &args.file, &args.s3_path)?;

    output_result(
        "Upload complete",
        &UploadResult {
            source: args.file.display().to_string(),
            destination: destination.to_string(),
            bytes,
        },
        cli_args,
    )
}

fn download_file(args: &DownloadArgs, cli_args: &SkillsArgs) -> Result<()> {
    let store = open_store(cli_args)?;
    let bytes = download(store.as_ref(), &args.out, &args.s3_path)?;

    output_result(
        "Download complete",
        &DownloadResult {
            source: args.s3_path.clone(),
            destination: args.out.display().to_string(),
            bytes,
        },
        cli_args,
    )
}

fn list_prefix(args: &ListArgs, cli_args: &SkillsArgs) -> Result<()> {
    let store = open_store(cli_args)?;
    let files = list_files(store.as_ref(), &args.s3_path)?;

    output_result(
        &format!("{} files under {}", files.len(), args.s3_path),
        &ListResult {
            prefix: args.s3_path.clone(),
            files,
        },
        cli_args,
    )
}

fn check_jsonl(args: &CheckJsonlArgs, cli_args: &SkillsArgs) -> Result<()> {
    let result = count_jsonl(args)?;
    output_result(&format!("Checked {}", args.file.display()), &result, cli_args)
}

/// Read a JSON-lines file in batches, counting what decodes and what is skipped.
fn count_jsonl(args: &CheckJsonlArgs) -> Result<JsonlCheckResult> {
    let mut stream = stream_json_file(&args.file)?;
    let mut records = 0;
    let mut batches = 0;
    {
        let mut groups = Batch::new(stream.by_ref(), args.batch_size)?;
        while let Some(group) = groups.next_group() {
            batches += 1;
            for record in group {
                record?;
                records += 1;
            }
        }
    }

    Ok(JsonlCheckResult {
        path: args.file.display().to_string(),
        lines: stream.lines_read(),
        records,
        skipped: stream.skipped(),
        batches,
    })
}
