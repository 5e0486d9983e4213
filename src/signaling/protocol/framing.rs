use super::{FrameError, FrameType, HEADER_LEN, PROTO_VERSION, ProtoError};
use std::io::{self, Read, Write};

/// Write a single frame: [ver][type][reserved u16=0][len u32][body...]
pub fn write_frame<W: Write>(w: &mut W, frame_type: FrameType, body: &[u8]) -> io::Result<()> {
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "body too large"))?;
    let mut header = [0u8; HEADER_LEN];
    header[0] = PROTO_VERSION;
    header[1] = frame_type.as_u8();
    header[2] = 0;
    header[3] = 0;
    header[4..8].copy_from_slice(&len.to_be_bytes());
    w.write_all(&header)?;
    w.write_all(body)?;
    w.flush()?;
    Ok(())
}

/// Read a single frame, enforcing a max body length.
///
/// An unknown type byte still consumes the body, so the stream stays in sync
/// and the caller may skip the frame.
pub fn read_frame<R: Read>(
    r: &mut R,
    max_body: usize,
) -> Result<(FrameType, Vec<u8>), FrameError> {
    let mut header = [0u8; HEADER_LEN];

    r.read_exact(&mut header)?; // io::Error -> FrameError::Io

    let ver = header[0];
    if ver != PROTO_VERSION {
        return Err(ProtoError::BadVersion(ver).into());
    }

    // flags ignored for now
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len > max_body {
        return Err(ProtoError::TooLarge {
            max: max_body,
            actual: len,
        }
        .into());
    }

    let mut body = vec![0u8; len];
    r.read_exact(&mut body)?;

    let frame_type = FrameType::from_u8(header[1])?;
    Ok((frame_type, body))
}
