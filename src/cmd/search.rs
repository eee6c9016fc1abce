use clap::*;
use std::io::Write;
use std::path::Path;

use criscan::{GroupGraph, Pipeline, RunOutcome, SearchParams};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("search")
        .about("Find CRISPR arrays in short sequencing reads")
        .after_help(
            r###"
Two passes over the input reads:

1. Each read is searched on its own for two or more copies of a short
   direct repeat; candidate arrays pass length, complexity, similarity
   and k-mer abundance checks.
2. Reads holding a single copy of an already-discovered repeat are
   rescued with a multi-pattern scan.

Reads are grouped by the canonical (lowest-lexicographic) form of
their repeat. Each group becomes a graph of repeat nodes joined by
spacer edges, pruned by coverage and colored on a rainbow ramp.

Outputs (into --outdir, or stdout):
    * crisprs.tsv       one summary line per group
    * group_<N>.txt     node and edge records of one group

Exit codes:
    * 0 - arrays found
    * 1 - inconsistent options
    * 2 - an input file could not be read
    * 3 - clean run, no arrays found

Examples:
1. Scan reads with the default repeat/spacer sizes:
   criscan search reads.fq.gz -o crispr_out

2. Relax the repeat length bounds and tolerate one mismatch:
   criscan search -d 20 -D 50 -m 1 reads.fa

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("Input FA/FQ file(s) to process, .gz supported"),
        )
        .arg(
            Arg::new("min-dr")
                .long("min-dr")
                .short('d')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("23")
                .help("Minimum direct repeat length"),
        )
        .arg(
            Arg::new("max-dr")
                .long("max-dr")
                .short('D')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("47")
                .help("Maximum direct repeat length"),
        )
        .arg(
            Arg::new("min-spacer")
                .long("min-spacer")
                .short('s')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("26")
                .help("Minimum spacer length"),
        )
        .arg(
            Arg::new("max-spacer")
                .long("max-spacer")
                .short('S')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("50")
                .help("Maximum spacer length"),
        )
        .arg(
            Arg::new("window")
                .long("window")
                .short('w')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("8")
                .help("Seed window length"),
        )
        .arg(
            Arg::new("scan-range")
                .long("scan-range")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("30")
                .help("Tolerance around the projected position when extending rightwards"),
        )
        .arg(
            Arg::new("min-repeats")
                .long("min-repeats")
                .short('n')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("3")
                .help("Minimum repeat copies per read"),
        )
        .arg(
            Arg::new("max-mismatches")
                .long("max-mismatches")
                .short('m')
                .num_args(1)
                .value_parser(value_parser!(u32))
                .default_value("0")
                .help("Substitutions tolerated when placing seeds"),
        )
        .arg(
            Arg::new("kmer")
                .long("kmer")
                .short('k')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("7")
                .help("k-mer size of the abundance filter"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output directory. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<i32> {
    //----------------------------
    // Args
    //----------------------------
    let params = SearchParams {
        min_repeat_len: *args.get_one::<usize>("min-dr").unwrap(),
        max_repeat_len: *args.get_one::<usize>("max-dr").unwrap(),
        min_spacer_len: *args.get_one::<usize>("min-spacer").unwrap(),
        max_spacer_len: *args.get_one::<usize>("max-spacer").unwrap(),
        window_len: *args.get_one::<usize>("window").unwrap(),
        scan_range: *args.get_one::<usize>("scan-range").unwrap(),
        min_seed_count: *args.get_one::<usize>("min-repeats").unwrap(),
        max_mismatches: *args.get_one::<u32>("max-mismatches").unwrap(),
        kmer_size: *args.get_one::<usize>("kmer").unwrap(),
    };
    let infiles: Vec<String> = args
        .get_many::<String>("infiles")
        .unwrap()
        .cloned()
        .collect();
    let opt_outdir = args.get_one::<String>("outdir").unwrap();

    let pipeline = match Pipeline::new(params) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("{}", e);
            return Ok(1);
        }
    };

    //----------------------------
    // Ops
    //----------------------------
    let outcome = pipeline.run(&infiles);

    if outcome.stats.files_read == 0 {
        log::error!("no input file could be read");
        return Ok(2);
    }

    write_reports(opt_outdir, &outcome)?;

    if outcome.stats.files_failed > 0 {
        return Ok(2);
    }
    if outcome.found_nothing() {
        log::warn!("no CRISPR arrays found");
        return Ok(3);
    }
    Ok(0)
}

fn write_reports(outdir: &str, outcome: &RunOutcome) -> anyhow::Result<()> {
    if outdir == "stdout" {
        let mut writer = intspan::writer("stdout");
        write_summary(&mut writer, outcome)?;
        for (i, manager) in outcome.groups.iter().enumerate() {
            write_graph(&mut writer, i + 1, &manager.describe(&outcome.pool))?;
        }
        return Ok(());
    }

    std::fs::create_dir_all(outdir)?;

    let summary_path = Path::new(outdir).join("crisprs.tsv");
    let mut writer = intspan::writer(summary_path.to_str().unwrap());
    write_summary(&mut writer, outcome)?;

    for (i, manager) in outcome.groups.iter().enumerate() {
        let graph_path = Path::new(outdir).join(format!("group_{}.txt", i + 1));
        let mut writer = intspan::writer(graph_path.to_str().unwrap());
        write_graph(&mut writer, i + 1, &manager.describe(&outcome.pool))?;
    }

    Ok(())
}

fn write_summary(writer: &mut Box<dyn Write>, outcome: &RunOutcome) -> anyhow::Result<()> {
    writer.write_fmt(format_args!(
        "#group\trepeat\treads\tnodes\tspacers\tmin_cov\tmax_cov\n"
    ))?;
    for (i, manager) in outcome.groups.iter().enumerate() {
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            i + 1,
            manager.canonical_repeat(),
            manager.read_count(),
            manager.node_count(),
            manager.spacer_count(),
            manager.min_coverage(),
            manager.max_coverage(),
        ))?;
    }
    Ok(())
}

fn write_graph(writer: &mut Box<dyn Write>, idx: usize, graph: &GroupGraph) -> anyhow::Result<()> {
    writer.write_fmt(format_args!(
        "#group {} {}\n",
        idx, graph.canonical_repeat
    ))?;
    for node in &graph.nodes {
        writer.write_fmt(format_args!(
            "node\t{}\t{}\t{}\t{},{},{}\t{}\n",
            node.id,
            node.repeat,
            node.coverage,
            node.color.0,
            node.color.1,
            node.color.2,
            if node.attached { "attached" } else { "detached" },
        ))?;
    }
    for edge in &graph.edges {
        writer.write_fmt(format_args!(
            "edge\t{}\t{}\t{}\t{}\t{}\n",
            edge.from_id,
            edge.to_id,
            edge.spacer,
            edge.coverage,
            if edge.attached { "attached" } else { "detached" },
        ))?;
    }
    Ok(())
}
