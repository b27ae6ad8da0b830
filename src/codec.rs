// location-bingo/src/codec.rs
// This module converts the card state to and from the `state`/`coupon` query parameters.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use url::form_urlencoded;

use crate::board::BoardState;
use crate::defs::{CELLCOUNT, COUPON_PARAM, STATE_PARAM};
use crate::error::{BingoError, Result};
use crate::reward::RewardCode;

// Standard alphabet, padded on output. Input may omit padding and may carry
// nonzero bits after the last byte, as browsers' atob tolerates both.
const STATE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// 25 `'0'`/`'1'` characters in cell order, then base64.
pub fn encode_state(state: &BoardState) -> String {
    let binary: String = state.cells().iter().map(|&visited| if visited { '1' } else { '0' }).collect();
    STATE_ENGINE.encode(binary)
}

pub fn decode_state(param: &str) -> Result<BoardState> {
    let bytes = STATE_ENGINE
        .decode(param.trim())
        .map_err(|e| BingoError::InvalidStateEncoding(e.to_string()))?;

    if bytes.len() != CELLCOUNT {
        return Err(BingoError::InvalidStateLength(bytes.len()));
    }

    let mut cells = [false; CELLCOUNT];
    for (cell, byte) in cells.iter_mut().zip(&bytes) {
        *cell = *byte == b'1';
    }
    Ok(BoardState::from_cells(cells))
}

/// The two query parameters that carry the whole game.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardQuery {
    pub state: Option<String>,
    pub coupon: Option<String>,
}

impl BoardQuery {
    /// Parses a raw query string, with or without the leading `?`.
    /// The first occurrence of a parameter wins; an empty coupon counts as absent.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut parsed = BoardQuery::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                STATE_PARAM if parsed.state.is_none() => parsed.state = Some(value.into_owned()),
                COUPON_PARAM if parsed.coupon.is_none() => parsed.coupon = Some(value.into_owned()),
                _ => {}
            }
        }

        parsed.coupon = parsed.coupon.filter(|coupon| !coupon.is_empty());
        parsed
    }

    pub fn from_board(state: &BoardState, coupon: Option<&RewardCode>) -> Self {
        BoardQuery {
            state: Some(encode_state(state)),
            coupon: coupon.map(|code| code.as_str().to_string()),
        }
    }

    /// Decoded state; `None` when the parameter is absent.
    pub fn board_state(&self) -> Option<Result<BoardState>> {
        self.state.as_deref().map(decode_state)
    }

    pub fn reward_code(&self) -> Option<RewardCode> {
        self.coupon.as_deref().map(RewardCode::from_raw)
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.coupon.is_none()
    }

    /// Query string without the leading `?`, `state` before `coupon`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(state) = &self.state {
            serializer.append_pair(STATE_PARAM, state);
        }
        if let Some(coupon) = &self.coupon {
            serializer.append_pair(COUPON_PARAM, coupon);
        }
        serializer.finish()
    }
}
