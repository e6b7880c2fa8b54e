//! Request body compression
//!
//! Bodies are compressed with zlib-wrapped deflate or gzip, matching the
//! `Content-Encoding` header produced by [`build_headers`](crate::headers::build_headers).

use crate::config::{CompressEncoding, Config};
use crate::error::Result;
use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use std::io::{Read, Write};

/// Stateless body compressor
///
/// `Copy` and free of interior state, so it can be shared across request tasks
/// without synchronization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Compressor {
    encoding: Option<CompressEncoding>,
}

impl Compressor {
    /// Create a compressor; `None` passes bodies through unchanged
    pub fn new(encoding: Option<CompressEncoding>) -> Self {
        Self { encoding }
    }

    /// Create a compressor from the `compress`/`compress_encoding` settings
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.compress.then_some(config.compress_encoding))
    }

    /// Encoding applied by this compressor, if any
    pub fn encoding(&self) -> Option<CompressEncoding> {
        self.encoding
    }

    /// Transform raw bytes into transport bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::Compression` if the encoder fails.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.encoding {
            None => Ok(data.to_vec()),
            Some(CompressEncoding::Deflate) => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Some(CompressEncoding::Gzip) => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
        }
    }

    /// Inverse of [`compress`](Self::compress)
    ///
    /// # Errors
    ///
    /// Returns `Error::Compression` if the input is not a valid stream for
    /// this encoding.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decompressed = Vec::new();
        match self.encoding {
            None => decompressed.extend_from_slice(data),
            Some(CompressEncoding::Deflate) => {
                ZlibDecoder::new(data).read_to_end(&mut decompressed)?;
            }
            Some(CompressEncoding::Gzip) => {
                GzDecoder::new(data).read_to_end(&mut decompressed)?;
            }
        }
        Ok(decompressed)
    }
}
