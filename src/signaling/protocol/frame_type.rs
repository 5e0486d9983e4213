use super::ProtoError;

/// Second header byte. Client frames live in `0x0_`, server frames in `0x8_`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum FrameType {
    Hello = 0x01,
    Signal = 0x02,
    SetStatus = 0x03,
    Bye = 0x04,

    Welcome = 0x81,
    Relayed = 0x82,
    DeliveryFailed = 0x83,
    Presence = 0x84,
}

impl FrameType {
    pub fn from_u8(v: u8) -> Result<FrameType, ProtoError> {
        use FrameType::*;
        match v {
            0x01 => Ok(Hello),
            0x02 => Ok(Signal),
            0x03 => Ok(SetStatus),
            0x04 => Ok(Bye),
            0x81 => Ok(Welcome),
            0x82 => Ok(Relayed),
            0x83 => Ok(DeliveryFailed),
            0x84 => Ok(Presence),
            other => Err(ProtoError::UnknownType(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
