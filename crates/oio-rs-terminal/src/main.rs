use std::io::Write;

use oio_rs::analysis::AnalysisStatus;
use oio_rs::archive::ListerSet;
use oio_rs::planner::PlanMode;

const DEFAULT_CONFIG: &str = "oio.json";

struct RunOptions {
	config_path: String,
	assume_yes: bool,
	dry_run: bool,
}

fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag( "h", "help",       "Show help");
		opts.optflag( "v", "verbose",    "Increased vebosity");
		opts.optopt(  "c", "config",     "Configuration file, defaults to oio.json", "CONFIG");
		opts.optflag( "y", "yes",        "Start disk operations without asking");
		opts.optflag( "n", "dry-run",    "Write reports but leave archives untouched");
		opts.optopt(  "",  "log-file",   "Also append the log to this file", "PATH");

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { println!("Unable to parse options: {}", e); return }
		};

		if parsed_options.opt_present("h") {
			eprintln!("{}", opts.usage("Usage: oio-rs-terminal [options]"));
			return;
		}

		parsed_options
	};

	if let Err(e) = init_logger(parsed_options.opt_present("v"), parsed_options.opt_str("log-file")) {
		eprintln!("Unable to open log file: {}", e);
		return;
	}

	let options = RunOptions {
		config_path: parsed_options.opt_str("c").unwrap_or_else(|| DEFAULT_CONFIG.to_string()),
		assume_yes: parsed_options.opt_present("y"),
		dry_run: parsed_options.opt_present("n"),
	};

	match run(&options) {
		Ok(_) => {},
		Err(Error::UserCancelled) => println!("Process cancelled, good bye."),
		Err(e) => {
			log::error!("{}", e);
			std::process::exit(1);
		},
	}
}

fn init_logger(verbose: bool, log_file: Option<String>) -> std::io::Result<()> {
	let level = if verbose { "debug" } else { "info" };
	let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
	if let Some(path) = log_file {
		let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
		builder.target(env_logger::Target::Pipe(Box::new(file)));
	}
	builder.init();
	Ok(())
}

fn run(options: &RunOptions) -> Result<(), Error> {
	let config = oio_rs::Config::load_from_disk(&options.config_path)?;
	log::info!("Objective Install Order, reading archives from {}", config.source_dir().display());

	let listers = ListerSet::from_config(&config);
	let result = match oio_rs::Analysis::run(&config, &listers)? {
		AnalysisStatus::NoOverlaps { suspicious, .. } => {
			println!("There is no overlapping module, nothing to do.");
			if !suspicious.is_empty() {
				let path = config.output_path(&config.analysis.suspicious);
				std::fs::write(&path, oio_rs::report::render_suspicious(&suspicious)).map_err(oio_rs::Error::from)?;
				println!("Files with unexpected extensions are listed in '{}'.", path.display());
			}
			return Ok(());
		},
		AnalysisStatus::Ordered(result) => result,
	};

	let plan = oio_rs::DiskPlan::from_config(&config, &result.free, result.ordered.iter().map(String::as_str));
	let reports = oio_rs::report::write_reports(&config, &result, &plan)?;

	println!("\t- Found {} overlapping module archives.", result.ordered.len());
	println!("\t- Found {} non overlapping module archives.", result.free.len());
	if result.graph.removed_count() > 0 {
		println!("\t- Discarded {} overlap(s) to break cycles.", result.graph.removed_count());
	}

	if plan.is_empty() {
		println!("Nothing to be done, your mod archives are already named as they should be. Congratulations :-)");
		return Ok(());
	}

	let operations = plan.operations().len();
	let overwritten = plan.overwritten().len();
	match plan.mode() {
		PlanMode::Rename => {
			if overwritten > 0 {
				println!("\nERROR: The renaming step will not be executed as {} archives would be lost (overwritten).", overwritten);
				println!("Refer to the file '{}' to see which files are involved,", reports.disk_operations.display());
				println!("then you should give them another name and try again.");
				return Ok(());
			}
			println!("\nRENAMING STEP: {} archives located in the '{}' directory will now be renamed with a numerical prefix.",
				operations, plan.target_dir().display());
		},
		PlanMode::Copy => {
			if overwritten > 0 {
				println!("\nWARNING: {} archives will be overwritten during the copy process.", overwritten);
			}
			println!("\nCOPY STEP: {} archives located in the '{}' directory and its subdirectories will now be copied to",
				operations, plan.source_dir().display());
			println!("the '{}' directory and renamed with a numerical prefix.", plan.target_dir().display());
		},
	}

	println!("\nIMPORTANT: You REALLY should consult the file '{}' which details the disk operations that are going to be done.",
		reports.disk_operations.display());
	if let Some(pdf) = &reports.overlaps_pdf {
		println!("\nYou can get a visual representation of mod precedence by opening the file '{}'.", pdf.display());
	}

	if options.dry_run {
		println!("\nDry run, no archive was touched.");
		return Ok(());
	}

	if !options.assume_yes {
		confirm()?;
	}

	plan.execute()?;
	println!("\nOperations done!");
	Ok(())
}

fn confirm() -> Result<(), Error> {
	print!("\nType 'yes' + Enter to start disk operations. ");
	let _ = std::io::stdout().flush();

	let mut input = String::new();
	std::io::stdin().read_line(&mut input).map_err(oio_rs::Error::from)?;
	if input.trim().to_lowercase() == "yes" {
		Ok(())
	} else {
		Err(Error::UserCancelled)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	OioRsError(#[from] oio_rs::Error),
	#[error("disk operation failed: {0}")]
	DiskOperation(#[from] oio_rs::planner::DiskOperationError),
	#[error("User cancelled an action")]
	UserCancelled,
}
