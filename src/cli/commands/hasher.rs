use crate::credential::WorkFactor;
use clap::{Arg, ArgMatches, Command};

pub const ARG_HASH_MEMORY_KIB: &str = "hash-memory-kib";
pub const ARG_HASH_ITERATIONS: &str = "hash-iterations";
pub const ARG_HASH_PARALLELISM: &str = "hash-parallelism";

/// Read the password hashing work factor, falling back to the Argon2 defaults.
#[must_use]
pub fn work_factor(matches: &ArgMatches) -> WorkFactor {
    let defaults = WorkFactor::default();
    WorkFactor::new(
        matches
            .get_one::<u32>(ARG_HASH_MEMORY_KIB)
            .copied()
            .unwrap_or(defaults.memory_kib),
        matches
            .get_one::<u32>(ARG_HASH_ITERATIONS)
            .copied()
            .unwrap_or(defaults.iterations),
        matches
            .get_one::<u32>(ARG_HASH_PARALLELISM)
            .copied()
            .unwrap_or(defaults.parallelism),
    )
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_HASH_MEMORY_KIB)
                .long(ARG_HASH_MEMORY_KIB)
                .help("Argon2 memory cost in KiB (default: 19456)")
                .env("TODOS_HASH_MEMORY_KIB")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_ITERATIONS)
                .long(ARG_HASH_ITERATIONS)
                .help("Argon2 iterations (default: 2)")
                .env("TODOS_HASH_ITERATIONS")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_PARALLELISM)
                .long(ARG_HASH_PARALLELISM)
                .help("Argon2 lanes (default: 1)")
                .env("TODOS_HASH_PARALLELISM")
                .value_parser(clap::value_parser!(u32)),
        )
}
