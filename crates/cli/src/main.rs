use clap::Parser;
use uibridge_cli::cli::Cli;
use uibridge_cli::output::{self, OutputFormat, ResultBuilder};
use uibridge_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = commands::command_name(&cli.command);

	match commands::run(cli.command, cli.uri).await {
		Ok(data) => {
			let result = ResultBuilder::new(command).data(data).build();
			output::print_result(&result, format);
		}
		Err(err) => {
			let cmd_error = err.to_command_error();

			// Always print to stderr for humans
			output::print_error_stderr(&cmd_error);

			// Also emit the envelope on stdout with ok=false (for agents)
			if format != OutputFormat::Text {
				let result: output::CommandResult<()> = ResultBuilder::new(command).failure(cmd_error).build();
				output::print_result(&result, format);
			}
			std::process::exit(1);
		}
	}
}
