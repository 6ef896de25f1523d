//! Compression wrappers for file streams.
//!
//! Decoders and encoders take ownership of the stream they wrap, so dropping
//! the wrapper releases the codec state before the underlying transport.

use flatql_common::file::Codec;
use flatql_error::{ErrorCode, FlatqlError, Result};
use std::io::{self, Read, Write};

pub type ByteStream = Box<dyn Read + Send>;

/// Wraps `inner` with the decoder for `codec`; passes it through when `None`.
pub fn decoder(codec: Option<Codec>, inner: ByteStream) -> Result<ByteStream> {
    let stream: ByteStream = match codec {
        None => inner,
        Some(Codec::Gzip) => Box::new(flate2::read::MultiGzDecoder::new(inner)),
        Some(Codec::Bzip2) => Box::new(bzip2::read::MultiBzDecoder::new(inner)),
        Some(Codec::Xz) => Box::new(xz2::read::XzDecoder::new_multi_decoder(inner)),
        Some(Codec::Zstd) => Box::new(zstd::stream::read::Decoder::new(inner).map_err(|e| {
            FlatqlError::new(
                ErrorCode::DecompressionFailed,
                format!("failed to initialize zstd decoder: {}", e),
            )
        })?),
    };
    Ok(stream)
}

/// Output side of a codec. `finish` must be called to flush trailing frames.
pub enum Encoder<W: Write> {
    Plain(W),
    Gzip(flate2::write::GzEncoder<W>),
    Bzip2(bzip2::write::BzEncoder<W>),
    Xz(xz2::write::XzEncoder<W>),
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> Encoder<W> {
    pub fn new(codec: Option<Codec>, inner: W) -> Result<Self> {
        let encoder = match codec {
            None => Encoder::Plain(inner),
            Some(Codec::Gzip) => {
                Encoder::Gzip(flate2::write::GzEncoder::new(inner, flate2::Compression::default()))
            }
            Some(Codec::Bzip2) => {
                Encoder::Bzip2(bzip2::write::BzEncoder::new(inner, bzip2::Compression::default()))
            }
            Some(Codec::Xz) => Encoder::Xz(xz2::write::XzEncoder::new(inner, 6)),
            Some(Codec::Zstd) => Encoder::Zstd(
                zstd::stream::write::Encoder::new(inner, zstd::DEFAULT_COMPRESSION_LEVEL).map_err(
                    |e| {
                        FlatqlError::new(
                            ErrorCode::WriteFailed,
                            format!("failed to initialize zstd encoder: {}", e),
                        )
                    },
                )?,
            ),
        };
        Ok(encoder)
    }

    /// Writes the codec trailer and returns the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Encoder::Plain(w) => Ok(w),
            Encoder::Gzip(e) => e.finish(),
            Encoder::Bzip2(e) => e.finish(),
            Encoder::Xz(e) => e.finish(),
            Encoder::Zstd(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Plain(w) => w.write(buf),
            Encoder::Gzip(e) => e.write(buf),
            Encoder::Bzip2(e) => e.write(buf),
            Encoder::Xz(e) => e.write(buf),
            Encoder::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Plain(w) => w.flush(),
            Encoder::Gzip(e) => e.flush(),
            Encoder::Bzip2(e) => e.flush(),
            Encoder::Xz(e) => e.flush(),
            Encoder::Zstd(e) => e.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PAYLOAD: &[u8] = b"id,name\n1,Gina\n2,Yulia\n";

    fn roundtrip(codec: Option<Codec>) -> Vec<u8> {
        let mut encoder = Encoder::new(codec, Vec::new()).unwrap();
        encoder.write_all(PAYLOAD).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut out = Vec::new();
        decoder(codec, Box::new(Cursor::new(compressed)))
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_every_codec_restores_payload() {
        for codec in [None, Some(Codec::Gzip), Some(Codec::Bzip2), Some(Codec::Xz), Some(Codec::Zstd)] {
            assert_eq!(roundtrip(codec), PAYLOAD, "codec {:?}", codec);
        }
    }

    #[test]
    fn test_gzip_stream_is_really_compressed() {
        let mut encoder = Encoder::new(Some(Codec::Gzip), Vec::new()).unwrap();
        encoder.write_all(PAYLOAD).unwrap();
        let compressed = encoder.finish().unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_corrupt_input_fails_on_read() {
        let mut out = Vec::new();
        let result = decoder(Some(Codec::Gzip), Box::new(Cursor::new(b"not gzip".to_vec())))
            .unwrap()
            .read_to_end(&mut out);
        assert!(result.is_err());
    }
}
