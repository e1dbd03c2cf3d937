//! CLI entry point for the 68HC11 emulator.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use hc11_core::{
    convert_hex_dump, disassemble_window, load_file, CoreConfig, ImageFormat, Machine,
    Registers,
};
use log::{Level, LevelFilter, Log, Metadata, Record};
#[cfg(test)]
use tempfile as _;

const USAGE_TEXT: &str = "\
Usage: hc11-emu <command> [options]

Commands:
  disasm  <image> [--start ADDR] [--count N]    Disassemble a program image
  run     <image> [--cycles N] [--break ADDR]   Run until a cycle budget or breakpoint
  hexdump <input> -o <output>                   Convert a monitor dump to binary

Options:
  -f, --format <s19|elf|bin>  Image format (default: inferred from extension)
      --org <ADDR>            Load address for binary images (default: 0)
      --start <ADDR>          First address to disassemble (default: entry point)
      --count <N>             Instructions to disassemble (default: 16)
      --cycles <N>            Cycle budget for run (default: one second at 2 MHz)
      --break <ADDR>          Halt when PC reaches ADDR (repeatable)
      --read-break <ADDR>     Halt after an instruction reads ADDR (repeatable)
      --write-break <ADDR>    Halt after an instruction writes ADDR (repeatable)
  -o, --output <file>         Binary written by hexdump
  -v, --verbose               Log debug messages to stderr
  -h, --help                  Show this help message

Addresses accept 0x1000, $1000 or decimal.

Examples:
  hc11-emu disasm program.s19 --count 32
  hc11-emu run rom.bin --org 0xE000 --break 0xE010
  hc11-emu hexdump capture.txt -o capture.bin
";

const DEFAULT_DISASM_COUNT: usize = 16;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Disasm(DisasmArgs),
    Run(RunArgs),
    Hexdump(HexdumpArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct ImageArgs {
    input: PathBuf,
    format: Option<ImageFormat>,
    org: u16,
}

#[derive(Debug, PartialEq, Eq)]
struct DisasmArgs {
    image: ImageArgs,
    start: Option<u16>,
    count: usize,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    image: ImageArgs,
    cycles: u64,
    breaks: Vec<u16>,
    read_breaks: Vec<u16>,
    write_breaks: Vec<u16>,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct HexdumpArgs {
    input: PathBuf,
    output: PathBuf,
    verbose: bool,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "disasm" => parse_disasm_args(args)
            .map(Command::Disasm)
            .map(ParseResult::Command),
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        "hexdump" => parse_hexdump_args(args)
            .map(Command::Hexdump)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn parse_address(value: &str) -> Result<u16, String> {
    let parsed = if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .or_else(|| value.strip_prefix('$'))
    {
        u16::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed.map_err(|_| format!("invalid address: {value}"))
}

fn option_value(args: &mut impl Iterator<Item = OsString>, name: &str) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {name}"))
}

/// Shared image options. Returns `Ok(true)` when `arg` was consumed.
fn parse_image_option(
    arg: &OsString,
    args: &mut impl Iterator<Item = OsString>,
    format: &mut Option<ImageFormat>,
    org: &mut u16,
) -> Result<bool, String> {
    if arg == "--format" || arg == "-f" {
        let name = option_value(args, "--format")?;
        *format = Some(
            ImageFormat::from_name(&name).ok_or_else(|| format!("unknown format: {name}"))?,
        );
        return Ok(true);
    }
    if arg == "--org" {
        *org = parse_address(&option_value(args, "--org")?)?;
        return Ok(true);
    }
    Ok(false)
}

fn set_input(input: &mut Option<PathBuf>, arg: OsString) -> Result<(), String> {
    if arg.to_string_lossy().starts_with('-') {
        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }
    if input.is_some() {
        return Err("multiple input paths provided".to_string());
    }
    *input = Some(PathBuf::from(arg));
    Ok(())
}

#[allow(clippy::while_let_on_iterator)]
fn parse_disasm_args(mut args: impl Iterator<Item = OsString>) -> Result<DisasmArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut format = None;
    let mut org = 0;
    let mut start = None;
    let mut count = DEFAULT_DISASM_COUNT;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }
        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }
        if parse_image_option(&arg, &mut args, &mut format, &mut org)? {
            continue;
        }
        if arg == "--start" {
            start = Some(parse_address(&option_value(&mut args, "--start")?)?);
            continue;
        }
        if arg == "--count" {
            let value = option_value(&mut args, "--count")?;
            count = value
                .parse()
                .map_err(|_| format!("invalid count: {value}"))?;
            continue;
        }
        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(DisasmArgs {
        image: ImageArgs { input, format, org },
        start,
        count,
        verbose,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut format = None;
    let mut org = 0;
    let mut cycles = CoreConfig::default().clock_hz;
    let mut breaks = Vec::new();
    let mut read_breaks = Vec::new();
    let mut write_breaks = Vec::new();
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }
        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }
        if parse_image_option(&arg, &mut args, &mut format, &mut org)? {
            continue;
        }
        if arg == "--cycles" {
            let value = option_value(&mut args, "--cycles")?;
            cycles = value
                .parse()
                .map_err(|_| format!("invalid cycle count: {value}"))?;
            continue;
        }
        if arg == "--break" {
            breaks.push(parse_address(&option_value(&mut args, "--break")?)?);
            continue;
        }
        if arg == "--read-break" {
            read_breaks.push(parse_address(&option_value(&mut args, "--read-break")?)?);
            continue;
        }
        if arg == "--write-break" {
            write_breaks.push(parse_address(&option_value(&mut args, "--write-break")?)?);
            continue;
        }
        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs {
        image: ImageArgs { input, format, org },
        cycles,
        breaks,
        read_breaks,
        write_breaks,
        verbose,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_hexdump_args(mut args: impl Iterator<Item = OsString>) -> Result<HexdumpArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }
        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }
        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -o".to_string())?;
            output = Some(PathBuf::from(value));
            continue;
        }
        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    let output = output.ok_or_else(|| "missing output path (-o)".to_string())?;
    Ok(HexdumpArgs {
        input,
        output,
        verbose,
    })
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let level = match record.level() {
                Level::Error => "error",
                Level::Warn => "warning",
                Level::Info => "info",
                Level::Debug => "debug",
                Level::Trace => "trace",
            };
            eprintln!("{level}: {}", record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn load_machine(image: &ImageArgs) -> Result<Machine, i32> {
    let format = image
        .format
        .unwrap_or_else(|| ImageFormat::from_path(&image.input));
    let mut machine = Machine::new();
    machine.set_pc(image.org);
    if let Err(e) = load_file(&mut machine, &image.input, format, image.org) {
        eprintln!("error: {}: {e}", image.input.display());
        return Err(1);
    }
    Ok(machine)
}

fn run_disasm(args: &DisasmArgs) -> Result<(), i32> {
    let machine = load_machine(&args.image)?;
    let start = args.start.unwrap_or_else(|| machine.pc());

    for row in disassemble_window(machine.memory(), start, args.count) {
        let hex_bytes: String = row
            .bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:04X}: {:<14} {:<24} ; {}",
            row.addr, hex_bytes, row.text, row.description
        );
    }
    Ok(())
}

fn print_registers(regs: &Registers) {
    println!(
        "A={:02X} B={:02X} D={:04X} X={:04X} Y={:04X} SP={:04X} PC={:04X} CCR={:08b}",
        regs.a(),
        regs.b(),
        regs.d(),
        regs.x(),
        regs.y(),
        regs.sp(),
        regs.pc(),
        regs.ccr()
    );
    println!("cycles={}", regs.cycles());
}

fn run_run(args: &RunArgs) -> Result<(), i32> {
    let mut machine = load_machine(&args.image)?;
    for &addr in &args.breaks {
        machine.add_exec_break(addr);
    }
    for &addr in &args.read_breaks {
        machine.add_read_break(addr);
    }
    for &addr in &args.write_breaks {
        machine.add_write_break(addr);
    }

    let outcome = machine.run_until(args.cycles);
    match outcome.halted_at {
        Some(addr) => println!("Breakpoint at {addr:04X} after {} steps", outcome.steps),
        None => println!("Cycle budget reached after {} steps", outcome.steps),
    }
    print_registers(machine.registers());

    let next = machine.disassemble(machine.pc());
    println!("next: {:04X}: {}", next.addr, next.text);
    Ok(())
}

fn run_hexdump(args: &HexdumpArgs) -> Result<(), i32> {
    let text = match fs::read_to_string(&args.input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: failed to read input: {e}");
            return Err(1);
        }
    };

    let bytes = convert_hex_dump(&text);
    if let Err(e) = fs::write(&args.output, &bytes) {
        eprintln!("error: failed to write output: {e}");
        return Err(1);
    }

    println!(
        "Converted {} ({} bytes) -> {}",
        args.input.display(),
        bytes.len(),
        args.output.display()
    );
    Ok(())
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(command)) => {
            let result = match command {
                Command::Disasm(args) => {
                    init_logging(args.verbose);
                    run_disasm(&args)
                }
                Command::Run(args) => {
                    init_logging(args.verbose);
                    run_run(&args)
                }
                Command::Hexdump(args) => {
                    init_logging(args.verbose);
                    run_hexdump(&args)
                }
            };
            match result {
                Ok(()) => 0,
                Err(code) => code,
            }
        }
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os_args(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_disasm_command() {
        let result = parse_disasm_args(os_args(&[
            "rom.bin",
            "--format",
            "bin",
            "--org",
            "0xE000",
            "--count",
            "4",
        ]))
        .expect("valid disasm args should parse");

        assert_eq!(
            result,
            DisasmArgs {
                image: ImageArgs {
                    input: PathBuf::from("rom.bin"),
                    format: Some(ImageFormat::Binary),
                    org: 0xE000,
                },
                start: None,
                count: 4,
                verbose: false,
            }
        );
    }

    #[test]
    fn parses_repeated_breakpoints() {
        let result = parse_run_args(os_args(&[
            "prog.s19",
            "--break",
            "$1000",
            "--break",
            "4098",
            "--write-break",
            "0x40",
            "-v",
        ]))
        .expect("valid run args should parse");

        assert_eq!(result.breaks, vec![0x1000, 0x1002]);
        assert_eq!(result.write_breaks, vec![0x0040]);
        assert!(result.read_breaks.is_empty());
        assert_eq!(result.cycles, 2_000_000);
        assert!(result.verbose);
    }

    #[test]
    fn hexdump_takes_input_and_output() {
        let result = parse_hexdump_args(os_args(&["dump.txt", "-o", "dump.bin"]))
            .expect("valid hexdump args should parse");
        assert_eq!(result.input, PathBuf::from("dump.txt"));
        assert_eq!(result.output, PathBuf::from("dump.bin"));
    }

    #[test]
    fn hexdump_requires_output_path() {
        let error = parse_hexdump_args(os_args(&["capture.txt"]))
            .expect_err("hexdump without -o should fail");
        assert!(error.contains("missing output path"));
    }

    #[test]
    fn long_and_short_help_flags() {
        for flag in ["--help", "-h"] {
            let result = parse_args(os_args(&[flag])).expect("help should parse without error");
            assert!(matches!(result, ParseResult::Help));
        }
    }

    #[test]
    fn assemble_is_not_a_command() {
        let error = parse_args(os_args(&["assemble"])).expect_err("unknown command should fail");
        assert!(error.contains("unknown command: assemble"));
    }

    #[test]
    fn bad_option_values_are_reported() {
        let error = parse_run_args(os_args(&["a.bin", "--break", "0xZZ"]))
            .expect_err("bad address should fail");
        assert!(error.contains("invalid address"));

        let error = parse_disasm_args(os_args(&["a.bin", "--format", "hex"]))
            .expect_err("bad format should fail");
        assert!(error.contains("unknown format"));

        let error =
            parse_run_args(os_args(&["a.bin", "--cycles"])).expect_err("missing value should fail");
        assert!(error.contains("missing value"));
    }

    #[test]
    fn hex_dollar_and_decimal_addresses() {
        assert_eq!(parse_address("0x00FF"), Ok(0x00FF));
        assert_eq!(parse_address("$E000"), Ok(0xE000));
        assert_eq!(parse_address("65535"), Ok(0xFFFF));
        assert!(parse_address("65536").is_err());
    }

    #[test]
    fn image_commands_need_an_input_path() {
        let error = parse_run_args(os_args(&["--cycles", "10"])).expect_err("run without image");
        assert!(error.contains("missing input"));

        let error = parse_disasm_args(os_args(&["a.s19", "b.s19"])).expect_err("two images");
        assert!(error.contains("multiple input paths"));
    }
}
