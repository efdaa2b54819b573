use cfbasic::mach::DEFAULT_LIMIT;
use cfbasic::term;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let mut memory_limit = DEFAULT_LIMIT;
    let mut filename: Option<String> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-M" | "--MEM" => {
                let size = match args.next() {
                    Some(size) => size,
                    None => {
                        eprintln!("Missing memory size argument");
                        print_usage();
                        std::process::exit(1);
                    }
                };
                memory_limit = match parse_memory_size(&size) {
                    Some(limit) => limit,
                    None => {
                        eprintln!("Invalid memory size: {}", size);
                        std::process::exit(1);
                    }
                };
            }
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-v" | "--version" => {
                println!("CFBASIC V{}", VERSION);
                return;
            }
            _ if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => filename = Some(arg),
        }
    }
    std::process::exit(term::main(memory_limit, filename.as_deref()));
}

fn print_usage() {
    println!("Usage: cfbasic [OPTIONS] [filename]");
    println!("Options:");
    println!("  -M, --MEM <size>    Set memory limit (e.g., 1G, 512M, 2048K)");
    println!("  -h, --help          Show this help message");
    println!("  -v, --version       Show version information");
}

/// Parse a size like `512`, `2048K`, `512M`, or `1G`. `None` for
/// anything non-positive or with an unknown suffix.
fn parse_memory_size(s: &str) -> Option<usize> {
    let s = s.trim();
    let split = s
        .find(|ch: char| !ch.is_ascii_digit() && ch != '.')
        .unwrap_or_else(|| s.len());
    let value = s[..split].parse::<f64>().ok()?;
    if value <= 0.0 {
        return None;
    }
    let multiplier = match s[split..].to_ascii_uppercase().as_str() {
        "" => 1.0,
        "K" => 1024.0,
        "M" => 1024.0 * 1024.0,
        "G" => 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some((value * multiplier) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_size() {
        assert_eq!(parse_memory_size("65536"), Some(65536));
        assert_eq!(parse_memory_size("2048K"), Some(2048 * 1024));
        assert_eq!(parse_memory_size("512m"), Some(512 * 1024 * 1024));
        assert_eq!(parse_memory_size("1G"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_memory_size("0"), None);
        assert_eq!(parse_memory_size("-5"), None);
        assert_eq!(parse_memory_size("64Q"), None);
        assert_eq!(parse_memory_size("junk"), None);
    }
}
