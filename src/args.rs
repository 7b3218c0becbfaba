use clap::Parser;

/// This program builds the datasets of the municipal election dashboard.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A configuration file in JSON format. It lists the input files, the output
    /// directory and the rules. Relative paths in the file are relative to the directory of the file.
    /// For more information about the file format, read the documentation of the council_seats::manual module.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, default 'data') The directory containing the input files election_summary.csv,
    /// candidate_details.csv.gz and SeatsAndCompensation.csv, for the inputs that the configuration
    /// does not list.
    #[clap(short, long, value_parser)]
    pub data_dir: Option<String>,

    /// (directory) If specified, the datasets will be written to this directory. Setting this option
    /// overrides the directory that may be specified with the --config option. By default, the
    /// datasets are written in the data directory.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected top_dashboard dataset in JSON format
    /// (compressed or not). If provided, the program will check that the computed dataset matches
    /// the reference and fail otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (YYYY-MM-DD, default: the current day) The day the seat timeline is computed for.
    /// Seat changes after this day are not displayed.
    #[clap(long, value_parser)]
    pub today: Option<String>,

    /// (default 8) The number of parties plotted in the seat timeline.
    #[clap(long, value_parser)]
    pub top_parties: Option<usize>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
