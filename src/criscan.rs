extern crate clap;
use clap::error::ErrorKind;
use clap::*;

mod cmd;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Command::new("criscan")
        .version(crate_version!())
        .about("CRISpr array SCANner - find CRISPR arrays in short sequencing reads")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd::search::make_subcommand())
        .after_help(
            r###"
* <infiles> are paths to fasta/fastq files, .fa.gz and .fq.gz are supported
    * infile == stdin means reading from STDIN

* `RUST_LOG=debug criscan search ...` traces seed placement and QC

"###,
        );

    // Check which subcomamnd the user ran...
    let code = match app.try_get_matches() {
        Ok(matches) => match matches.subcommand() {
            Some(("search", sub_matches)) => match cmd::search::execute(sub_matches) {
                Ok(code) => code,
                Err(e) => {
                    log::error!("{}", e);
                    2
                }
            },
            _ => unreachable!(),
        },
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            }
        }
    };

    std::process::exit(code);
}
