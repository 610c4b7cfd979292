use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Opens a file and transparently peels off GZIP/BGZF layers to expose the
/// underlying text stream.
///
/// Compression is detected from magic bytes, not the file extension.
pub fn open_input(path: &Path) -> anyhow::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    wrap_reader(Box::new(BufReader::new(file)))
}

/// Same detection as [`open_input`] for an already open stream.
pub fn wrap_reader(mut reader: Box<dyn BufRead + Send>) -> anyhow::Result<Box<dyn BufRead + Send>> {
    // Limit nesting to avoid looping on malformed inputs
    const MAX_DEPTH: usize = 4;

    for _ in 0..MAX_DEPTH {
        let is_gzip = {
            let buf = reader.fill_buf()?;
            // GZIP magic: 1f 8b
            buf.len() >= 2 && buf[0] == 0x1f && buf[1] == 0x8b
        };

        if !is_gzip {
            break;
        }

        tracing::debug!("Detected GZIP/BGZF layer");
        // MultiGzDecoder handles BGZF and concatenated members
        reader = Box::new(BufReader::new(MultiGzDecoder::new(reader)));
    }

    Ok(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compression, write::GzEncoder};
    use std::io::{Cursor, Read, Write};

    fn read_all(mut reader: Box<dyn BufRead + Send>) -> String {
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn plain_text_is_returned_as_is() {
        let reader = wrap_reader(Box::new(Cursor::new(b"##fileformat=VCFv4.2\n".to_vec()))).unwrap();
        assert_eq!(read_all(reader), "##fileformat=VCFv4.2\n");
    }

    #[test]
    fn gzip_layer_is_decoded() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"#CHROM\tPOS\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let reader = wrap_reader(Box::new(Cursor::new(compressed))).unwrap();
        assert_eq!(read_all(reader), "#CHROM\tPOS\n");
    }

    #[test]
    fn empty_input_is_accepted() {
        let reader = wrap_reader(Box::new(Cursor::new(Vec::new()))).unwrap();
        assert_eq!(read_all(reader), "");
    }
}
