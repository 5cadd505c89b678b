//! Handlers behind the `youtube-faces` subcommands.

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use log::{debug, warn};

use crate::cli::{
    AnnotationsArgs, CheckfilesArgs, Commands, DumplistArgs, DumppairsArgs, PathArgs, ReverseArgs,
};
use crate::config::DbConfig;
use crate::data::filter::ObjectQuery;
use crate::data::model::Landmarks;
use crate::database::Database;

/// Result of a command that ran without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// Ran, but found nothing or something missing.
    NotFound,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::NotFound => ExitCode::FAILURE,
        }
    }
}

/// Run `command` against `db`.
///
/// In self-test mode the output is discarded, the status of the command is
/// ignored and the outcome of [`Database::self_check`] decides the exit code.
pub fn execute(db: &Database, config: &DbConfig, command: &Commands) -> Result<ExitCode> {
    if command.self_test() {
        let status = dispatch(db, config, command, &mut io::sink())?;
        debug!("self-test command finished with {status:?}");
        return Ok(match db.self_check() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("self-test failed: {err}");
                ExitCode::FAILURE
            }
        });
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let status = dispatch(db, config, command, &mut handle)?;
    handle.flush()?;
    Ok(status.into())
}

/// Run `command`, writing its report to `out`.
pub fn dispatch(
    db: &Database,
    config: &DbConfig,
    command: &Commands,
    out: &mut dyn Write,
) -> Result<Status> {
    match command {
        Commands::Dumplist(args) => dumplist(db, config, args, out),
        Commands::Dumppairs(args) => dumppairs(db, config, args, out),
        Commands::Checkfiles(args) => checkfiles(db, config, args, out),
        Commands::Reverse(args) => reverse(db, args, out),
        Commands::Annotations(args) => annotations(db, args, out),
        Commands::Path(args) => path(db, config, args, out),
    }
}

fn dumplist(db: &Database, config: &DbConfig, args: &DumplistArgs, out: &mut dyn Write) -> Result<Status> {
    let mut query = ObjectQuery::new()
        .groups(args.groups.iter().copied())
        .purposes(args.purposes.iter().copied());
    if let Some(protocol) = args.protocol {
        query = query.protocol(protocol);
    }
    if let Some(world_type) = args.world_type {
        query = query.world_type(world_type);
    }
    if let Some(subworld) = args.subworld {
        query = query.subworld(subworld);
    }

    for file in db.objects(&query) {
        let name = db.original_file_name(file, &config.image_directory, &config.extension);
        writeln!(out, "{}", name.display())?;
    }
    Ok(Status::Success)
}

fn dumppairs(db: &Database, config: &DbConfig, args: &DumppairsArgs, out: &mut dyn Write) -> Result<Status> {
    let pairs = db.pairs(args.protocol, &args.groups, &args.classes);
    for pair in pairs {
        let names = db.paths(
            &[pair.enrol_file, pair.probe_file],
            &config.image_directory,
            &config.extension,
        );
        if let [enrol, probe] = names.as_slice() {
            writeln!(out, "{} {}", enrol.display(), probe.display())?;
        }
    }
    Ok(Status::Success)
}

fn checkfiles(db: &Database, config: &DbConfig, _args: &CheckfilesArgs, out: &mut dyn Write) -> Result<Status> {
    let mut missing = 0usize;
    for file in db.all_files() {
        let name = db.original_file_name(file, &config.image_directory, &config.extension);
        if !name.is_file() {
            writeln!(out, "{}", name.display())?;
            missing += 1;
        }
    }
    if missing > 0 {
        warn!(
            "{missing} catalog files are missing below '{}'",
            describe_directory(&config.image_directory)
        );
        return Ok(Status::NotFound);
    }
    Ok(Status::Success)
}

fn reverse(db: &Database, args: &ReverseArgs, out: &mut dyn Write) -> Result<Status> {
    let files = db.reverse(&args.paths);
    for file in &files {
        writeln!(out, "{}", file.id)?;
    }
    Ok(found(!files.is_empty()))
}

fn annotations(db: &Database, args: &AnnotationsArgs, out: &mut dyn Write) -> Result<Status> {
    if db.file(args.id).is_none() {
        return Ok(Status::NotFound);
    }
    match &args.annotation_type {
        Some(annotation_type) => {
            let landmarks = db.annotations(args.id, annotation_type);
            write_landmarks(out, annotation_type, &landmarks)?;
            Ok(found(!landmarks.is_empty()))
        }
        None => {
            let all = db.all_annotations(args.id);
            for (annotation_type, landmarks) in &all {
                write_landmarks(out, annotation_type, landmarks)?;
            }
            Ok(Status::Success)
        }
    }
}

fn write_landmarks(out: &mut dyn Write, annotation_type: &str, landmarks: &Landmarks) -> io::Result<()> {
    for (name, [y, x]) in landmarks {
        writeln!(out, "{annotation_type} {name} {y} {x}")?;
    }
    Ok(())
}

fn path(db: &Database, config: &DbConfig, args: &PathArgs, out: &mut dyn Write) -> Result<Status> {
    let names = db.paths(&args.ids, &config.image_directory, &config.extension);
    for name in &names {
        writeln!(out, "{}", name.display())?;
    }
    Ok(found(!names.is_empty()))
}

fn found(any: bool) -> Status {
    if any {
        Status::Success
    } else {
        Status::NotFound
    }
}

/// Human-readable name of the image directory; empty means the working directory.
fn describe_directory(dir: &Path) -> String {
    if dir.as_os_str().is_empty() {
        ".".to_string()
    } else {
        dir.display().to_string()
    }
}
