use clap::Args;
use meq_solver::io::Market;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write, stdin, stdout},
    path::PathBuf,
    str::FromStr,
};

/// Where a subcommand reads its market document and writes its report
#[derive(Args, Debug)]
pub struct IOArgs {
    /// Market document to solve, or "-" to read it from stdin
    #[arg(value_parser = clap::value_parser!(Stream))]
    input: Stream,

    /// Destination of the JSON report, or "-" for stdout
    #[arg(short, long, default_value = "-", value_parser = clap::value_parser!(Stream))]
    output: Stream,
}

impl IOArgs {
    /// Parse the market document
    pub fn read_market(&self) -> anyhow::Result<Market> {
        let reader: Box<dyn Read> = match &self.input {
            Stream::File(path) => Box::new(BufReader::new(File::open(path)?)),
            Stream::Std => Box::new(stdin().lock()),
        };
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write a report as pretty-printed JSON, followed by a newline
    pub fn write_report<T: Serialize>(&self, report: &T) -> anyhow::Result<()> {
        let mut writer: Box<dyn Write> = match &self.output {
            Stream::File(path) => Box::new(BufWriter::new(File::create(path)?)),
            Stream::Std => Box::new(stdout().lock()),
        };
        serde_json::to_writer_pretty(&mut writer, report)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// A file on disk, or the standard stream matching its direction
#[derive(Clone, Debug, PartialEq)]
enum Stream {
    File(PathBuf),
    Std,
}

impl FromStr for Stream {
    type Err = <PathBuf as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" => Ok(Self::Std),
            path => Ok(Self::File(path.parse()?)),
        }
    }
}
