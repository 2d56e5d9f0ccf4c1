use bag_reader::OpenBag;
use std::env;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-bag-file> [--connections]", args[0]);
        std::process::exit(1);
    }

    let bag_path = &args[1];
    let show_connections = args.iter().skip(2).any(|arg| arg == "--connections");

    println!("Reading bag file: {}", bag_path);
    println!("{}", "=".repeat(60));

    let result = OpenBag::open(bag_path).and_then(|bag| {
        let index = bag.scan()?;
        Ok((bag.len(), index))
    });

    match result {
        Ok((file_len, index)) => {
            let defined: Vec<_> = index.connections().iter().filter(|c| c.is_defined()).collect();

            println!("\nBag Information:");
            println!("  Size: {} bytes", file_len);
            println!("  Index position: {}", index.index_pos());
            println!("  Connections: {}", defined.len());
            println!("  Chunks: {}", index.chunks().len());
            println!("  Messages: {}", index.message_count());
            match index.time_range() {
                Some((start, end)) => println!("  Time range: {} .. {}", start, end),
                None => println!("  Time range: (no chunk info)"),
            }

            if show_connections {
                println!("\nConnections:");
                for conn in &defined {
                    println!(
                        "  [{}] {} ({}, {} indexed messages)",
                        conn.id,
                        conn.topic,
                        conn.data.message_type,
                        conn.num_entries()
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("\nERROR: Failed to read bag file");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
