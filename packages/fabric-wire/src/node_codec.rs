//! `Node` wire encoding (spec §6): a two-field record
//! `(variant_tag, magnitude)`. Round-trips bit-exactly for `integer`,
//! `allocated`, `character`, and `special`; `real` preserves its IEEE
//! bit pattern via `f64::to_bits`/`from_bits`, matching
//! `fabric_core::node`'s own bit-pattern-based ordering so the wire
//! form and the in-memory total order agree.

use fabric_core::{Node, Special};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WireError};

const TAG_SPECIAL: u8 = 0;
const TAG_INTEGER: u8 = 1;
const TAG_REAL: u8 = 2;
const TAG_CHARACTER: u8 = 3;
const TAG_ALLOCATED: u8 = 4;

const SPECIAL_NULL: u64 = 0;
const SPECIAL_TRUE: u64 = 1;
const SPECIAL_FALSE: u64 = 2;

/// The `(variant_tag, magnitude)` record itself (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireNode {
    pub variant_tag: u8,
    pub magnitude: u64,
}

impl From<Node> for WireNode {
    fn from(node: Node) -> Self {
        let (variant_tag, magnitude) = match node {
            Node::Special(Special::Null) => (TAG_SPECIAL, SPECIAL_NULL),
            Node::Special(Special::True) => (TAG_SPECIAL, SPECIAL_TRUE),
            Node::Special(Special::False) => (TAG_SPECIAL, SPECIAL_FALSE),
            Node::Integer(v) => (TAG_INTEGER, v),
            Node::Real(v) => (TAG_REAL, v.to_bits()),
            Node::Character(c) => (TAG_CHARACTER, c as u64),
            Node::Allocated(v) => (TAG_ALLOCATED, v),
        };
        WireNode {
            variant_tag,
            magnitude,
        }
    }
}

impl TryFrom<WireNode> for Node {
    type Error = WireError;

    fn try_from(wire: WireNode) -> Result<Node> {
        match wire.variant_tag {
            TAG_SPECIAL => match wire.magnitude {
                SPECIAL_NULL => Ok(Node::NULL),
                SPECIAL_TRUE => Ok(Node::TRUE),
                SPECIAL_FALSE => Ok(Node::FALSE),
                other => Err(WireError::InvalidSpecialMagnitude(other)),
            },
            TAG_INTEGER => Ok(Node::integer(wire.magnitude)),
            TAG_REAL => Ok(Node::real(f64::from_bits(wire.magnitude))),
            TAG_CHARACTER => {
                let scalar = u32::try_from(wire.magnitude)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(WireError::InvalidCharacterMagnitude(wire.magnitude))?;
                Ok(Node::character(scalar))
            }
            TAG_ALLOCATED => Ok(Node::allocated(wire.magnitude)),
            other => Err(WireError::UnknownVariantTag(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trips(node: Node) {
        let wire = WireNode::from(node);
        let back = Node::try_from(wire).unwrap();
        assert_eq!(node, back);
    }

    #[test]
    fn integer_round_trips() {
        round_trips(Node::integer(42));
        round_trips(Node::integer(0));
        round_trips(Node::integer(u64::MAX));
    }

    #[test]
    fn allocated_round_trips() {
        round_trips(Node::allocated(7));
    }

    #[test]
    fn character_round_trips() {
        round_trips(Node::character('z'));
        round_trips(Node::character('日'));
    }

    #[test]
    fn special_variants_round_trip() {
        round_trips(Node::NULL);
        round_trips(Node::TRUE);
        round_trips(Node::FALSE);
    }

    #[test]
    fn real_preserves_exact_bit_pattern_including_nan() {
        round_trips(Node::real(1.5));
        round_trips(Node::real(-0.0));
        let nan_wire = WireNode::from(Node::real(f64::NAN));
        let Node::Real(back) = Node::try_from(nan_wire).unwrap() else {
            panic!("expected a real node");
        };
        assert_eq!(back.to_bits(), f64::NAN.to_bits());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = Node::try_from(WireNode {
            variant_tag: 9,
            magnitude: 0,
        })
        .unwrap_err();
        assert_eq!(err, WireError::UnknownVariantTag(9));
    }

    #[test]
    fn out_of_range_special_magnitude_is_rejected() {
        let err = Node::try_from(WireNode {
            variant_tag: 0,
            magnitude: 99,
        })
        .unwrap_err();
        assert_eq!(err, WireError::InvalidSpecialMagnitude(99));
    }

    #[test]
    fn surrogate_code_point_is_rejected_as_a_character() {
        let err = Node::try_from(WireNode {
            variant_tag: 3,
            magnitude: 0xD800,
        })
        .unwrap_err();
        assert_eq!(err, WireError::InvalidCharacterMagnitude(0xD800));
    }

    proptest::proptest! {
        #[test]
        fn integers_round_trip_over_the_full_range(v: u64) {
            let wire = WireNode::from(Node::integer(v));
            let back = Node::try_from(wire).unwrap();
            prop_assert_eq!(back, Node::integer(v));
        }

        #[test]
        fn reals_round_trip_by_bit_pattern(bits: u64) {
            let node = Node::real(f64::from_bits(bits));
            let wire = WireNode::from(node);
            let Node::Real(back) = Node::try_from(wire).unwrap() else {
                panic!("expected a real node");
            };
            prop_assert_eq!(back.to_bits(), bits);
        }
    }
}
