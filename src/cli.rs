use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::ConfigOverrides;
use crate::data::model::FileId;
use crate::data::protocol::{Group, PairLabel, Protocol, Purpose, Subworld, WorldType};

#[derive(Parser, Debug)]
#[command(
    name = "youtube-faces",
    version,
    about = "Query the fold-based face verification benchmark catalog"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Catalog file (.json) or table directory [env: YOUTUBE_FACES_CATALOG]"
    )]
    pub catalog: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        let output = self.command.output();
        ConfigOverrides {
            catalog: self.catalog.clone(),
            image_directory: output.and_then(|o| o.directory.clone()),
            extension: output.and_then(|o| o.extension.clone()),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List file names matching the filters.
    Dumplist(DumplistArgs),
    /// List verification pairs as `enrol probe` file names.
    Dumppairs(DumppairsArgs),
    /// Report catalog files missing from the image directory.
    Checkfiles(CheckfilesArgs),
    /// Print the ids of files with the given relative paths.
    Reverse(ReverseArgs),
    /// Print the annotations of one file.
    Annotations(AnnotationsArgs),
    /// Print the file names of the given ids.
    Path(PathArgs),
}

impl Commands {
    pub fn self_test(&self) -> bool {
        match self {
            Commands::Dumplist(args) => args.self_test,
            Commands::Dumppairs(args) => args.self_test,
            Commands::Checkfiles(args) => args.self_test,
            Commands::Reverse(args) => args.self_test,
            Commands::Annotations(args) => args.self_test,
            Commands::Path(args) => args.self_test,
        }
    }

    pub fn output(&self) -> Option<&OutputArgs> {
        match self {
            Commands::Dumplist(args) => Some(&args.output),
            Commands::Dumppairs(args) => Some(&args.output),
            Commands::Checkfiles(args) => Some(&args.output),
            Commands::Path(args) => Some(&args.output),
            Commands::Reverse(_) | Commands::Annotations(_) => None,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    #[arg(
        short,
        long,
        help = "Directory the file names are relative to [env: YOUTUBE_FACES_IMAGES]"
    )]
    pub directory: Option<PathBuf>,
    #[arg(
        short,
        long,
        help = "Extension appended to file names [env: YOUTUBE_FACES_EXTENSION, default: .jpg]"
    )]
    pub extension: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DumplistArgs {
    #[arg(long)]
    pub protocol: Option<Protocol>,
    #[arg(long = "group", value_name = "GROUP")]
    pub groups: Vec<Group>,
    #[arg(long = "purpose", value_name = "PURPOSE")]
    pub purposes: Vec<Purpose>,
    #[arg(long)]
    pub world_type: Option<WorldType>,
    #[arg(long)]
    pub subworld: Option<Subworld>,
    #[command(flatten)]
    pub output: OutputArgs,
    #[arg(long, help = "Discard output and run the consistency check")]
    pub self_test: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DumppairsArgs {
    #[arg(long)]
    pub protocol: Option<Protocol>,
    #[arg(long = "group", value_name = "GROUP")]
    pub groups: Vec<Group>,
    #[arg(long = "class", value_name = "CLASS", help = "match/client or mismatch/impostor")]
    pub classes: Vec<PairLabel>,
    #[command(flatten)]
    pub output: OutputArgs,
    #[arg(long, help = "Discard output and run the consistency check")]
    pub self_test: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckfilesArgs {
    #[command(flatten)]
    pub output: OutputArgs,
    #[arg(long, help = "Discard output and run the consistency check")]
    pub self_test: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReverseArgs {
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<String>,
    #[arg(long, help = "Discard output and run the consistency check")]
    pub self_test: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnnotationsArgs {
    pub id: FileId,
    #[arg(long = "type", value_name = "TYPE", help = "Only this annotation type")]
    pub annotation_type: Option<String>,
    #[arg(long, help = "Discard output and run the consistency check")]
    pub self_test: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    #[arg(required = true, value_name = "ID")]
    pub ids: Vec<FileId>,
    #[command(flatten)]
    pub output: OutputArgs,
    #[arg(long, help = "Discard output and run the consistency check")]
    pub self_test: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filters_by_name() {
        let cli = Cli::try_parse_from([
            "youtube-faces",
            "dumplist",
            "--protocol=fold8",
            "--group=dev",
            "--purpose=enrol",
            "--self-test",
        ])
        .unwrap();
        let Commands::Dumplist(args) = cli.command else {
            panic!("expected dumplist");
        };
        assert_eq!(args.protocol, Some(Protocol::Fold(8)));
        assert_eq!(args.groups, vec![Group::Dev]);
        assert_eq!(args.purposes, vec![Purpose::Enrol]);
        assert!(args.self_test);
    }

    #[test]
    fn class_aliases_map_to_labels() {
        let cli = Cli::try_parse_from(["youtube-faces", "dumppairs", "--class=client"]).unwrap();
        let Commands::Dumppairs(args) = cli.command else {
            panic!("expected dumppairs");
        };
        assert_eq!(args.classes, vec![PairLabel::Match]);
    }

    #[test]
    fn unknown_protocol_is_a_usage_error() {
        let err = Cli::try_parse_from(["youtube-faces", "dumplist", "--protocol=fold12"]).unwrap_err();
        assert!(err.to_string().contains("fold12"));
    }

    #[test]
    fn output_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "youtube-faces",
            "--catalog",
            "/tmp/c.json",
            "path",
            "7",
            "-d",
            "/images",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.catalog, Some(PathBuf::from("/tmp/c.json")));
        assert_eq!(overrides.image_directory, Some(PathBuf::from("/images")));
        assert_eq!(overrides.extension, None);
    }
}
