use clap::Parser;
use marlin::Session;
use marlin::SessionConfig;
use resp::Command;
use resp::Response;
use resp::Verb;
use tokio::net::TcpStream;
use tokio::task::LocalSet;

#[derive(Parser, Debug)]
#[command(author, version, about = "Send one command to a Redis-compatible server")]
struct Cli {
	/// Server address
	#[arg(long, default_value = "127.0.0.1:6379")]
	addr: String,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn")]
	log_level: String,

	/// Command verb; multi-word verbs are spelled as separate words,
	/// e.g. `marlin-cli client getname`
	command: String,

	/// Command arguments
	args: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let cli = Cli::parse();
	telemetry::logger::init(&cli.log_level);

	// the session engine is single-threaded cooperative
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()?;
	let local = LocalSet::new();
	runtime.block_on(local.run_until(run(cli)))
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let mut words: Vec<&str> = vec![cli.command.as_str()];
	words.extend(cli.args.iter().map(|arg| arg.as_str()));

	let Some((verb, consumed)) = Verb::lookup(&words) else {
		return Err(format!("unknown command '{}'", cli.command).into());
	};
	let command = Command::with_text_args(verb, words[consumed..].iter().copied());

	let stream = TcpStream::connect(&cli.addr).await?;
	let session = Session::new(stream, SessionConfig::default());

	session.send(&command)?;
	let response = session.receive().await?;
	println!("{}", render(&response));

	session.send_end_of_stream().await?;
	Ok(())
}

fn render(response: &Response) -> String {
	match response {
		Response::SimpleString(s) => s.clone(),
		Response::Error(message) => format!("(error) {}", message),
		Response::Integer(i) => format!("(integer) {}", i),
		Response::Bulk(payload) => format!("\"{}\"", String::from_utf8_lossy(payload)),
		Response::Nil => "(nil)".to_string(),
		Response::Array(items) => {
			if items.is_empty() {
				return "(empty array)".to_string();
			}
			items
				.iter()
				.enumerate()
				.map(|(index, item)| format!("{}) {}", index + 1, render(item)))
				.collect::<Vec<_>>()
				.join("\n")
		}
	}
}
