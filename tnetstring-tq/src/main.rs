mod parser;

use tnetstring::*;
use std::io::{self, Read, Write};
use anyhow::{Context, Result};
use structopt::StructOpt;
use std::str::from_utf8;

/// Decode and print tnetstring messages
#[derive(StructOpt)]
#[structopt(name = "tq")]
struct Opt {
    /// parse a textual representation and encode it into a tnetstring instead
    #[structopt(short, long)]
    encode: bool,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer).context("Failed to read stdin")?;
    if opt.encode {
        encode(&buffer)
    } else {
        print(&buffer)
    }
}

fn print(buffer: &[u8]) -> Result<()> {
    let (value, _) = Decoder::decode(&buffer).context("Decoding error")?;
    println!("{}", &value);
    Ok(())
}

fn encode(buffer: &[u8]) -> Result<()> {
    let string = from_utf8(&buffer).context("input is not utf-8")?;
    let value = parser::parse(string)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    Encoder::encode(&value, &mut handle).context("Encoding error")?;
    handle.flush()?;
    Ok(())
}
