use std::fs::OpenOptions;
use std::io::{self, Write};

use crate::reducer::Reduction;

const HEADER: &str = "workers, partition, start, count, partial, total";

// append one line per partition; header only when the file is new
pub fn log_reduction(log_location: &str, workers: usize, reduction: &Reduction) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_location)?;

    if file.metadata()?.len() == 0 {
        writeln!(file, "{}", HEADER)?;
    }

    for partial in &reduction.partials {
        writeln!(
            file,
            "{}, {}, {}, {}, {}, {}",
            workers,
            partial.partition.index,
            partial.partition.start,
            partial.partition.count,
            partial.value,
            reduction.total
        )?;
    }
    Ok(())
}
