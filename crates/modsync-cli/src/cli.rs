use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract records from a module index without storing anything
    #[command(arg_required_else_help = true)]
    Parse {
        /// modules.yaml file, optionally gzip or zstd compressed, or `-` for stdin
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        file: String,

        /// Only extract these modules
        #[arg(required = false, short, long = "module")]
        modules: Vec<String>,
    },

    /// Extract records from a module index and store them
    #[command(arg_required_else_help = true)]
    #[clap(name = "import", visible_alias = "i")]
    Import {
        /// modules.yaml file, optionally gzip or zstd compressed, or `-` for stdin
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        file: String,

        /// Only import these modules
        #[arg(required = false, short, long = "module")]
        modules: Vec<String>,
    },

    /// List stored records
    #[command(arg_required_else_help = true)]
    #[clap(name = "list", visible_alias = "ls")]
    List {
        #[clap(subcommand)]
        target: ListTarget,
    },

    /// Print the canonical document of a stored stream or defaults entry
    #[command(arg_required_else_help = true)]
    Show {
        /// Stream identity as NAME:STREAM:VERSION:CONTEXT:ARCH, or the full
        /// digest of a defaults document
        #[arg(required = true)]
        target: String,
    },

    /// Print the configuration file to stdout
    Config,

    /// Generate default config
    #[clap(name = "defconfig")]
    DefConfig,

    /// View env
    Env,
}

#[derive(Subcommand)]
pub enum ListTarget {
    /// List stored module streams
    Streams {
        /// Filter by module name
        #[arg(required = false, short, long)]
        name: Option<String>,

        /// Filter by stream name
        #[arg(required = false, short, long)]
        stream: Option<String>,
    },

    /// List stored default-stream declarations
    Defaults {
        /// Filter by module name
        #[arg(required = false, short, long)]
        module: Option<String>,
    },
}
