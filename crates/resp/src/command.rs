//! Outbound command model: verbs and their arguments.

use bytes::Bytes;

/// A command verb, possibly multi-word.
///
/// Each verb carries a fixed sequence of wire tokens; `CLIENT GETNAME` is two
/// tokens, most verbs are one. The catalogue here is the subset the client
/// façade and CLI use, not the full Redis command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
	Ping,
	Echo,
	Quit,
	Get,
	Set,
	Del,
	Exists,
	Incr,
	Decr,
	Expire,
	Ttl,
	Lpush,
	Rpush,
	Lpop,
	Rpop,
	Llen,
	ClientGetname,
	ClientSetname,
	ConfigGet,
}

impl Verb {
	/// The verb's wire tokens, each encoded as its own bulk string.
	pub fn tokens(&self) -> &'static [&'static str] {
		match self {
			Verb::Ping => &["PING"],
			Verb::Echo => &["ECHO"],
			Verb::Quit => &["QUIT"],
			Verb::Get => &["GET"],
			Verb::Set => &["SET"],
			Verb::Del => &["DEL"],
			Verb::Exists => &["EXISTS"],
			Verb::Incr => &["INCR"],
			Verb::Decr => &["DECR"],
			Verb::Expire => &["EXPIRE"],
			Verb::Ttl => &["TTL"],
			Verb::Lpush => &["LPUSH"],
			Verb::Rpush => &["RPUSH"],
			Verb::Lpop => &["LPOP"],
			Verb::Rpop => &["RPOP"],
			Verb::Llen => &["LLEN"],
			Verb::ClientGetname => &["CLIENT", "GETNAME"],
			Verb::ClientSetname => &["CLIENT", "SETNAME"],
			Verb::ConfigGet => &["CONFIG", "GET"],
		}
	}

	const ALL: &'static [Verb] = &[
		Verb::Ping,
		Verb::Echo,
		Verb::Quit,
		Verb::Get,
		Verb::Set,
		Verb::Del,
		Verb::Exists,
		Verb::Incr,
		Verb::Decr,
		Verb::Expire,
		Verb::Ttl,
		Verb::Lpush,
		Verb::Rpush,
		Verb::Lpop,
		Verb::Rpop,
		Verb::Llen,
		Verb::ClientGetname,
		Verb::ClientSetname,
		Verb::ConfigGet,
	];

	/// Resolve a verb from leading textual tokens, case-insensitively.
	///
	/// Returns the verb and how many input tokens it consumed. Multi-word
	/// verbs win over their one-word prefix, so `["CLIENT", "GETNAME"]`
	/// resolves to `CLIENT GETNAME` and consumes two tokens.
	pub fn lookup(input: &[&str]) -> Option<(Verb, usize)> {
		let mut best: Option<(Verb, usize)> = None;
		for verb in Verb::ALL {
			let tokens = verb.tokens();
			if tokens.len() > input.len() {
				continue;
			}
			let matches = tokens
				.iter()
				.zip(input)
				.all(|(token, word)| token.eq_ignore_ascii_case(word));
			if matches && best.map_or(true, |(_, n)| tokens.len() > n) {
				best = Some((*verb, tokens.len()));
			}
		}
		best
	}
}

/// One outbound command: a verb plus opaque argument bytes.
///
/// Arguments are binary safe; text helpers convert through UTF-8. The wire
/// framing never depends on the argument contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
	verb: Verb,
	args: Vec<Bytes>,
}

impl Command {
	/// A command with no arguments.
	pub fn new(verb: Verb) -> Self {
		Self {
			verb,
			args: Vec::new(),
		}
	}

	/// A command with raw byte arguments.
	pub fn with_args(verb: Verb, args: impl IntoIterator<Item = Bytes>) -> Self {
		Self {
			verb,
			args: args.into_iter().collect(),
		}
	}

	/// A command with text arguments, converted to UTF-8 bytes.
	pub fn with_text_args<'a>(verb: Verb, args: impl IntoIterator<Item = &'a str>) -> Self {
		Self {
			verb,
			args: args
				.into_iter()
				.map(|arg| Bytes::copy_from_slice(arg.as_bytes()))
				.collect(),
		}
	}

	/// Append one raw argument.
	pub fn arg(mut self, arg: impl Into<Bytes>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn verb(&self) -> Verb {
		self.verb
	}

	pub fn args(&self) -> &[Bytes] {
		&self.args
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_lookup_single_token() {
		let (verb, consumed) = Verb::lookup(&["get", "foo"]).unwrap();
		assert_eq!(verb, Verb::Get);
		assert_eq!(consumed, 1);
	}

	#[test]
	fn test_lookup_prefers_multi_token() {
		let (verb, consumed) = Verb::lookup(&["CLIENT", "getname"]).unwrap();
		assert_eq!(verb, Verb::ClientGetname);
		assert_eq!(consumed, 2);
	}

	#[test]
	fn test_lookup_unknown() {
		assert_eq!(Verb::lookup(&["FLY"]), None);
		assert_eq!(Verb::lookup(&[]), None);
	}

	#[test]
	fn test_command_builders() {
		let cmd = Command::with_text_args(Verb::Set, ["key", "value"]);
		assert_eq!(cmd.verb(), Verb::Set);
		assert_eq!(cmd.args().len(), 2);
		assert_eq!(&cmd.args()[0][..], b"key");

		let cmd = Command::new(Verb::Ping).arg(Bytes::from_static(b"hello"));
		assert_eq!(cmd.args().len(), 1);
	}
}
