use srecordlib::{Address, SRecord};
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum FileType {
    Bin,
    SRec,
    Other,
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");

    println!(" ---------------------------------------------");
    println!("|  Motorola S-record Utility  | v{version}       |");
    println!(" ---------------------------------------------");
    println!("\nUsage:");
    println!("  srecli info <input> [--strict]");
    println!("  srecli dump <input> [--strict]");
    println!("  srecli convert <input> <output> [options]");
    println!("\nOptions:");
    println!("  --address <val>       Base address for convert from BIN to S-record");
    println!("  --gap-fill <val>      Byte to fill gaps when converting to BIN (default: 0xFF)");
    println!("  --line-length <num>   Characters per data line when writing S-records (max: 92)");
    println!("  --strict              Enforce header, termination, line count and type rules");
    println!("\nFile types:");
    println!("  .s19 .s28 .s37 .srec .mot .sx   S-record");
    println!("  .bin                            raw binary");
    println!("\nExamples:");
    println!("  srecli info firmware.s19");
    println!("  srecli convert firmware.s37 firmware.bin --gap-fill 0x00");
    println!("  srecli convert firmware.bin firmware.s19 --address 0x8000 --line-length 46");
    println!("\nSet RUST_LOG=debug for parser diagnostics.");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    // Dispatch and immediately handle results
    if let Err(e) = run_dispatch(command, &args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_dispatch(cmd: &str, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let strict = args.iter().any(|arg| arg == "--strict");

    match cmd {
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        "info" | "dump" => {
            // Guard: Check args count
            let path_str = args.get(2).ok_or("Missing input file path")?;

            // Guard: File must exist
            let abs_path = validate_exists(path_str)?;

            if get_file_type(&abs_path) != FileType::SRec {
                return Err(format!("Not an S-record file: {path_str}").into());
            }

            let srec = load_srec(&abs_path, strict)?;
            if cmd == "info" {
                run_info(&abs_path, &srec);
            } else {
                print!("{}", srec.dump());
            }
            Ok(())
        }
        "convert" => {
            // Guard: Check file paths arguments given
            let in_path_str = args.get(2).ok_or("Missing input path")?;
            let out_path_str = args.get(3).ok_or("Missing output path")?;

            // Guard: Check input exists
            let in_abs_path = validate_exists(in_path_str)?;

            let out_path = PathBuf::from(out_path_str);
            let in_file_type = get_file_type(&in_abs_path);
            let out_file_type = get_file_type(&out_path);

            // Guard: Check files are of a supported type
            if in_file_type == FileType::Other || out_file_type == FileType::Other {
                return Err("Input or output files are of unsupported type".into());
            }

            let addr_str = get_flag_value(args, "--address");
            let gap_fill_str = get_flag_value(args, "--gap-fill");
            let line_length_str = get_flag_value(args, "--line-length");

            // Guard: Address is required when converting FROM bin, and only then
            if addr_str.is_some() && in_file_type != FileType::Bin {
                return Err(
                    "Base address '--address' is only supported for BIN to S-record conversion"
                        .into(),
                );
            } else if addr_str.is_none() && in_file_type == FileType::Bin {
                return Err(
                    "Base address '--address' is required for BIN to S-record conversion".into(),
                );
            }
            let base_addr = match addr_str {
                Some(addr) => {
                    Some(parse_hex_str(&addr).map_err(|_e| format!("Invalid address: {addr}"))?)
                }
                None => None,
            };

            // Guard: Gap fill only makes sense when converting TO bin
            if gap_fill_str.is_some() && out_file_type != FileType::Bin {
                return Err("Gap fill '--gap-fill' is only supported for conversion to BIN".into());
            }
            let gap_fill = match gap_fill_str {
                Some(gap_fill) => u8::try_from(
                    parse_hex_str(&gap_fill)
                        .map_err(|_e| format!("Invalid gap fill: {gap_fill}"))?,
                )?,
                None => 0xFF,
            };

            // Guard: Line length only applies when writing S-records
            if line_length_str.is_some() && out_file_type != FileType::SRec {
                return Err(
                    "Line length '--line-length' is only supported for S-record output".into(),
                );
            }
            let line_length = match line_length_str {
                Some(len) => len
                    .parse::<usize>()
                    .map_err(|_e| format!("Invalid line length: {len}"))?,
                None => 0,
            };

            let options = ConvertOptions {
                base_addr,
                gap_fill,
                line_length,
                strict,
            };
            run_convert(&in_abs_path, &out_path, &options)
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}

struct ConvertOptions {
    base_addr: Option<Address>,
    gap_fill: u8,
    line_length: usize,
    strict: bool,
}

fn run_info(path: &Path, srec: &SRecord) {
    fn format_addr(addr: Address) -> String {
        let s = format!("{addr:08X}");
        format!("0x{}_{}", &s[..s.len() - 4], &s[s.len() - 4..])
    }

    fn format_with_commas(n: usize) -> String {
        let s = n.to_string();
        s.as_bytes()
            .rchunks(3)
            .rev()
            .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",")
    }

    let data_type = srec
        .address_width()
        .data_type()
        .map_or_else(|| "-".to_string(), |t| format!("S{}", t as u8));

    println!("File Path:   {}", path.display());
    println!("Header:      {}", srec.header_str());
    println!("Data Type:   {data_type}");
    println!(
        "Data Size:   {} bytes",
        format_with_commas(srec.blocks().byte_count())
    );
    println!("Blocks:      {}", srec.blocks().len());
    println!(
        "Range:       {} - {}",
        format_addr(srec.start()),
        format_addr(srec.end()),
    );
    println!("Start Addr:  {}", format_addr(srec.termination_address()));
}

fn run_convert(
    in_path: &Path,
    out_path: &Path,
    options: &ConvertOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let srec = match options.base_addr {
        Some(base) => SRecord::from_bin(in_path, base)?,
        None => load_srec(in_path, options.strict)?,
    };

    if get_file_type(out_path) == FileType::Bin {
        srec.write_bin(out_path, options.gap_fill)?;
    } else {
        srec.write_srec(out_path, options.line_length)?;
    }

    // Validate output file was written
    let out_abs_path = validate_exists(&out_path.to_string_lossy())?;

    println!(
        "Converted {} -> {}",
        in_path.display(),
        out_abs_path.display()
    );
    Ok(())
}

// =============================== HELPER FUNCTIONS ===============================

fn load_srec(path: &Path, strict: bool) -> Result<SRecord, Box<dyn std::error::Error>> {
    let mut srec = SRecord::new();
    srec.set_strict_parsing(strict);
    srec.load(path)?;
    Ok(srec)
}

/// Parse a string as a hex number (with optional 0x prefix)
fn parse_hex_str(s: &str) -> Result<Address, std::num::ParseIntError> {
    let s = s.trim();

    // Handle explicit 0x prefix
    if let Some(hex_str) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return Address::from_str_radix(hex_str, 16);
    }

    // Parse as hex without prefix
    Address::from_str_radix(s, 16)
}

/// Determine `FileType` based on the file's extension (case-insensitive)
fn get_file_type(path: &Path) -> FileType {
    const SREC_EXTENSIONS: [&str; 6] = ["s19", "s28", "s37", "srec", "mot", "sx"];

    let Some(ext) = path.extension() else {
        return FileType::Other;
    };
    if ext.eq_ignore_ascii_case("bin") {
        FileType::Bin
    } else if SREC_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
        FileType::SRec
    } else {
        FileType::Other
    }
}

/// Validate that a path exists and is a file. Returns absolute path.
fn validate_exists(path_str: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = PathBuf::from(path_str);
    if !path.exists() {
        return Err(format!("File not found: {path_str}").into());
    }
    if !path.is_file() {
        return Err(format!("Path is not a file: {path_str}").into());
    }
    // Return absolute path
    Ok(std::fs::canonicalize(path)?)
}

/// Find the value after a specific flag (e.g., "--gap-fill 0xFF")
fn get_flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}
