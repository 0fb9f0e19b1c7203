use crate::crypto::{self, Sealed};
use crate::{bits, effective_password, lsb, Carrier, Result, StegoError, HEADER_BITS};
use log::debug;
use serde::Serialize;
use std::io::{BufRead, Seek};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeOutcome {
    pub message: String,
    pub decryption_used: bool,
    /// Counted in characters, not bytes.
    pub message_length: usize,
}

#[derive(Debug, Default)]
pub struct Decoder {}

impl Decoder {
    pub fn new() -> Self {
        Self {}
    }

    pub fn decode<R: BufRead + Seek>(
        &self,
        input_image: R,
        password: Option<&str>,
    ) -> Result<DecodeOutcome> {
        let carrier = Carrier::read(input_image)?;
        self.decode_carrier(&carrier, password)
    }

    /// Reads the header first, then exactly as many body bits as it
    /// announces, so the cost is bounded by the payload and not the image.
    pub fn decode_carrier(&self, carrier: &Carrier, password: Option<&str>) -> Result<DecodeOutcome> {
        let mut frame_bits = lsb::extract(carrier, HEADER_BITS);
        let header = bits::unpack_header(&frame_bits).map_err(no_hidden_message)?;

        debug!("decoded header: {:?}", header);

        if header.frame_bits() > carrier.embeddable_bits() {
            return Err(no_hidden_message(StegoError::TruncatedFrame {
                needed: header.frame_bits(),
                available: carrier.embeddable_bits(),
            }));
        }

        frame_bits.extend(lsb::extract_range(carrier, HEADER_BITS, header.body_bits()));
        let frame = bits::unpack(&frame_bits).map_err(no_hidden_message)?;

        let (plaintext, decryption_used) = if frame.encrypted {
            let password = effective_password(password).ok_or(StegoError::PasswordRequired)?;
            let sealed = Sealed::from_bytes(&frame.body).map_err(no_hidden_message)?;
            (crypto::decrypt(&sealed, password)?, true)
        } else {
            (frame.body, false)
        };

        let message = String::from_utf8(plaintext).map_err(|err| {
            debug!("payload is not UTF-8: {}", err);
            StegoError::NoHiddenMessage
        })?;

        Ok(DecodeOutcome {
            message_length: message.chars().count(),
            message,
            decryption_used,
        })
    }
}

fn no_hidden_message(err: StegoError) -> StegoError {
    debug!("no valid frame: {}", err);
    StegoError::NoHiddenMessage
}
