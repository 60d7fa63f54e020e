//! Script inspection for signature-operation counting
//!
//! Script execution itself lives outside this crate. What the cost accounter
//! needs from it is captured by [`SigOpCounter`]; [`ScriptSigOps`] implements
//! the standard counting rules over raw script bytes.

use crate::constants::*;
use crate::types::*;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

/// Sig-op counting supplied by the script interpreter
pub trait SigOpCounter {
    /// Count sig-ops in `script`. In accurate mode CHECKMULTISIG preceded by
    /// OP_1..OP_16 counts that many keys instead of the maximum.
    fn sig_op_count(&self, script: &[u8], accurate: bool) -> u32;

    /// Count sig-ops of a P2SH `script_pubkey` by evaluating the redeem script
    /// pushed last by `script_sig`
    fn p2sh_sig_op_count(&self, script_pubkey: &[u8], script_sig: &[u8]) -> u32;

    /// Count sig-ops executed by a witness program
    fn witness_sig_op_count(
        &self,
        script_sig: &[u8],
        script_pubkey: &[u8],
        witness: Option<&Witness>,
        flags: u32,
    ) -> u32;
}

/// Standard sig-op counting over serialized scripts
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptSigOps;

impl SigOpCounter for ScriptSigOps {
    fn sig_op_count(&self, script: &[u8], accurate: bool) -> u32 {
        let mut count = 0u32;
        let mut last_opcode: Option<u8> = None;
        for instruction in Instructions::new(script) {
            let Ok((opcode, _)) = instruction else {
                break;
            };
            match opcode {
                OP_CHECKSIG | OP_CHECKSIGVERIFY => count += 1,
                OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                    count += match last_opcode {
                        Some(op @ OP_1..=OP_16) if accurate => decode_small_int(op) as u32,
                        _ => MAX_PUBKEYS_PER_MULTISIG,
                    };
                }
                _ => {}
            }
            last_opcode = Some(opcode);
        }
        count
    }

    fn p2sh_sig_op_count(&self, script_pubkey: &[u8], script_sig: &[u8]) -> u32 {
        if !is_pay_to_script_hash(script_pubkey) {
            return self.sig_op_count(script_pubkey, true);
        }

        // The redeem script is the last push; anything other than pushes yields nothing
        let mut redeem_script: &[u8] = &[];
        for instruction in Instructions::new(script_sig) {
            let Ok((opcode, data)) = instruction else {
                return 0;
            };
            if opcode > OP_16 {
                return 0;
            }
            redeem_script = data;
        }
        self.sig_op_count(redeem_script, true)
    }

    fn witness_sig_op_count(
        &self,
        script_sig: &[u8],
        script_pubkey: &[u8],
        witness: Option<&Witness>,
        flags: u32,
    ) -> u32 {
        if flags & SCRIPT_VERIFY_WITNESS == 0 {
            return 0;
        }

        if let Some((version, program)) = witness_program(script_pubkey) {
            return self.witness_program_sig_ops(version, program, witness);
        }

        if is_pay_to_script_hash(script_pubkey) && is_push_only(script_sig) {
            let mut subscript: &[u8] = &[];
            for (_, data) in Instructions::new(script_sig).flatten() {
                subscript = data;
            }
            if let Some((version, program)) = witness_program(subscript) {
                return self.witness_program_sig_ops(version, program, witness);
            }
        }

        0
    }
}

impl ScriptSigOps {
    fn witness_program_sig_ops(&self, version: u8, program: &[u8], witness: Option<&Witness>) -> u32 {
        if version != 0 {
            // Future versions are unencumbered
            return 0;
        }
        match program.len() {
            20 => 1,
            32 => witness
                .and_then(|stack| stack.last())
                .map(|script| self.sig_op_count(script, true))
                .unwrap_or(0),
            _ => 0,
        }
    }
}

const NO_DATA: &[u8] = &[];

/// Malformed push encountered while iterating a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptParseError;

/// Iterator over (opcode, pushed data) pairs of a serialized script
pub struct Instructions<'a> {
    script: &'a [u8],
    position: usize,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(script: &'a [u8]) -> Self {
        Self { script, position: 0, failed: false }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(len)?;
        let data = self.script.get(self.position..end)?;
        self.position = end;
        Some(data)
    }

    fn push_len(&mut self, opcode: u8) -> Option<usize> {
        match opcode {
            OP_PUSHDATA1 => self.take(1).map(|b| b[0] as usize),
            OP_PUSHDATA2 => self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]) as usize),
            OP_PUSHDATA4 => self
                .take(4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize),
            n => Some(n as usize),
        }
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<(u8, &'a [u8]), ScriptParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.script.len() {
            return None;
        }
        let opcode = self.script[self.position];
        self.position += 1;
        if opcode > OP_PUSHDATA4 {
            return Some(Ok((opcode, NO_DATA)));
        }
        match self.push_len(opcode).and_then(|len| self.take(len)) {
            Some(data) => Some(Ok((opcode, data))),
            None => {
                self.failed = true;
                Some(Err(ScriptParseError))
            }
        }
    }
}

/// OP_N → N for OP_0 and OP_1..OP_16
pub fn decode_small_int(opcode: u8) -> u8 {
    if opcode == OP_0 {
        0
    } else {
        opcode - (OP_1 - 1)
    }
}

/// OP_HASH160 <20 bytes> OP_EQUAL
pub fn is_pay_to_script_hash(script: &[u8]) -> bool {
    script.len() == 23
        && script[0] == OP_HASH160
        && script[1] == 0x14
        && script[22] == OP_EQUAL
}

/// True iff the script parses and contains only push operations
pub fn is_push_only(script: &[u8]) -> bool {
    Instructions::new(script).all(|instruction| matches!(instruction, Ok((opcode, _)) if opcode <= OP_16))
}

/// Split a witness program into (version, program).
///
/// A witness program is a one-byte version push followed by a single direct
/// push of 2 to 40 bytes.
pub fn witness_program(script: &[u8]) -> Option<(u8, &[u8])> {
    if script.len() < 4 || script.len() > 42 {
        return None;
    }
    let version = script[0];
    if version != OP_0 && !(OP_1..=OP_16).contains(&version) {
        return None;
    }
    if script[1] as usize + 2 != script.len() {
        return None;
    }
    Some((decode_small_int(version), &script[2..]))
}
