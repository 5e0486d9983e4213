use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{ClientFrame, FrameError, FrameType, ProtoError, ServerFrame, read_frame, write_frame};

fn write_json<W: Write, T: Serialize>(
    w: &mut W,
    frame_type: FrameType,
    frame: &T,
) -> Result<(), FrameError> {
    let body = serde_json::to_vec(frame)?;
    write_frame(w, frame_type, &body)?;
    Ok(())
}

fn read_json<R: Read, T: DeserializeOwned>(
    r: &mut R,
    max_body: usize,
    frame_type_of: impl Fn(&T) -> FrameType,
) -> Result<T, FrameError> {
    let (header, body) = read_frame(r, max_body)?;
    let frame: T = serde_json::from_slice(&body)?;
    let body_type = frame_type_of(&frame);
    if body_type != header {
        return Err(ProtoError::TypeMismatch {
            header,
            body: body_type,
        }
        .into());
    }
    Ok(frame)
}

pub fn write_client_frame<W: Write>(w: &mut W, frame: &ClientFrame) -> Result<(), FrameError> {
    write_json(w, frame.frame_type(), frame)
}

pub fn read_client_frame<R: Read>(r: &mut R, max_body: usize) -> Result<ClientFrame, FrameError> {
    read_json(r, max_body, ClientFrame::frame_type)
}

pub fn write_server_frame<W: Write>(w: &mut W, frame: &ServerFrame) -> Result<(), FrameError> {
    write_json(w, frame.frame_type(), frame)
}

pub fn read_server_frame<R: Read>(r: &mut R, max_body: usize) -> Result<ServerFrame, FrameError> {
    read_json(r, max_body, ServerFrame::frame_type)
}
