//! Byte-at-a-time parser for the host command stream.
//!
//! Input may be chunked arbitrarily and may contain noise. The parser never
//! fails: stray bytes go to the console, unknown opcodes drop back to idle, and
//! resynchronization happens on the next [`SYNC_BYTE`]. Each payload state owns
//! exactly the fields it assembles.
use super::{
    BusWord, ChecksumPolicy, Command, Event, Opcode, BINARY_MODE_BYTE, MAX_CAN_SPEED,
    MAX_SINGLE_WIRE_SPEED, SYNC_BYTE,
};
use crate::infra::codec::checksum::XorDigest;
use crate::protocol::transport::can_frame::{BusIndex, Frame, MAX_DATA_LEN};
use crate::protocol::transport::can_id::WireId;

//==================================================================================STATES
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FramePurpose {
    Transmit,
    Echo,
}

/// Frame command payload: id(4) bus(1) len(1) data(len) checksum(1).
#[derive(Clone, Copy, Debug)]
struct FrameAssembly {
    purpose: FramePurpose,
    step: u16,
    id: u32,
    bus: u8,
    len: u8,
    data: [u8; MAX_DATA_LEN],
    digest: XorDigest,
}

impl FrameAssembly {
    fn new(purpose: FramePurpose) -> Self {
        Self {
            purpose,
            step: 0,
            id: 0,
            bus: 0,
            len: 0,
            data: [0; MAX_DATA_LEN],
            digest: XorDigest::new(),
        }
    }

    /// Consume one byte. Returns the received checksum once the payload is complete.
    fn push(&mut self, byte: u8) -> Option<u8> {
        let step = self.step;
        self.step += 1;
        match step {
            0..=3 => self.id |= (byte as u32) << (step * 8),
            4 => self.bus = byte & 0x03,
            5 => self.len = (byte & 0x0F).min(MAX_DATA_LEN as u8),
            _ => {
                let index = (step - 6) as usize;
                if index >= self.len as usize {
                    return Some(byte);
                }
                self.data[index] = byte;
            }
        }
        self.digest.update(byte);
        None
    }

    fn frame(&self) -> Frame {
        Frame::from_wire(WireId(self.id), &self.data[..self.len as usize])
    }
}

/// `N` consecutive little-endian 32-bit words.
#[derive(Clone, Copy, Debug)]
struct WordAssembly<const N: usize> {
    step: u16,
    words: [u32; N],
}

impl<const N: usize> WordAssembly<N> {
    fn new() -> Self {
        Self {
            step: 0,
            words: [0; N],
        }
    }

    /// Consume one byte; `true` once all words are complete.
    fn push(&mut self, byte: u8) -> bool {
        let word = (self.step / 4) as usize;
        let shift = (self.step % 4) * 8;
        self.words[word] |= (byte as u32) << shift;
        self.step += 1;
        self.step as usize == N * 4
    }
}

#[derive(Clone, Copy, Debug)]
enum State {
    Idle,
    GetCommand,
    Frame(FrameAssembly),
    SetDigitalOutputs,
    SetupCanbus(WordAssembly<2>),
    SetSingleWireMode,
    SetSystemType,
    SetupExtBuses(WordAssembly<3>),
}

//==================================================================================PARSER
/// Host command parser. Lives for the whole session; returns to idle after
/// every completed or abandoned command.
#[derive(Debug)]
pub struct CommandParser {
    state: State,
    policy: ChecksumPolicy,
    last_checksum: Option<u8>,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(ChecksumPolicy::default())
    }
}

impl CommandParser {
    pub const fn new(policy: ChecksumPolicy) -> Self {
        Self {
            state: State::Idle,
            policy,
            last_checksum: None,
        }
    }

    pub fn policy(&self) -> ChecksumPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ChecksumPolicy) {
        self.policy = policy;
    }

    /// Waiting for a framing byte.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// Abandon any command in progress.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// XOR computed over the payload of the last completed frame command.
    pub fn last_checksum(&self) -> Option<u8> {
        self.last_checksum
    }

    /// Feed one host byte.
    pub fn push_byte(&mut self, byte: u8) -> Option<Event> {
        match core::mem::replace(&mut self.state, State::Idle) {
            State::Idle => match byte {
                SYNC_BYTE => {
                    self.state = State::GetCommand;
                    None
                }
                BINARY_MODE_BYTE => Some(Event::EnableBinaryMode),
                other => Some(Event::Console(other)),
            },
            State::GetCommand => self.begin_command(byte),
            State::Frame(mut assembly) => match assembly.push(byte) {
                Some(received) => self.finish_frame(&assembly, received),
                None => {
                    self.state = State::Frame(assembly);
                    None
                }
            },
            State::SetDigitalOutputs => {
                Some(Event::Command(Command::SetDigitalOutputs(byte)))
            }
            State::SetupCanbus(mut words) => {
                if !words.push(byte) {
                    self.state = State::SetupCanbus(words);
                    return None;
                }
                Some(Event::Command(Command::SetupCanbus {
                    can0: BusWord::decode(words.words[0], MAX_CAN_SPEED),
                    can1: BusWord::decode(words.words[1], MAX_CAN_SPEED),
                }))
            }
            State::SetSingleWireMode => Some(Event::Command(Command::SetSingleWireMode {
                enabled: byte == 0x10,
            })),
            State::SetSystemType => Some(Event::Command(Command::SetSystemType(byte))),
            State::SetupExtBuses(mut words) => {
                if !words.push(byte) {
                    self.state = State::SetupExtBuses(words);
                    return None;
                }
                Some(Event::Command(Command::SetupExtBuses {
                    single_wire: BusWord::decode(words.words[0], MAX_SINGLE_WIRE_SPEED),
                    reserved: [words.words[1], words.words[2]],
                }))
            }
        }
    }

    /// Opcode byte: answer-only commands complete here, others enter their payload state.
    fn begin_command(&mut self, byte: u8) -> Option<Event> {
        let opcode = match Opcode::try_from(byte) {
            Ok(opcode) => opcode,
            Err(unknown) => return Some(Event::UnknownOpcode(unknown)),
        };
        let command = match opcode {
            Opcode::BuildCanFrame => {
                self.state = State::Frame(FrameAssembly::new(FramePurpose::Transmit));
                return None;
            }
            Opcode::EchoCanFrame => {
                self.state = State::Frame(FrameAssembly::new(FramePurpose::Echo));
                return None;
            }
            Opcode::SetDigitalOutputs => {
                self.state = State::SetDigitalOutputs;
                return None;
            }
            Opcode::SetupCanbus => {
                self.state = State::SetupCanbus(WordAssembly::new());
                return None;
            }
            Opcode::SetSingleWireMode => {
                self.state = State::SetSingleWireMode;
                return None;
            }
            Opcode::SetSystemType => {
                self.state = State::SetSystemType;
                return None;
            }
            Opcode::SetExtBuses => {
                self.state = State::SetupExtBuses(WordAssembly::new());
                return None;
            }
            Opcode::TimeSync => Command::TimeSync,
            Opcode::DigitalInputs => Command::DigitalInputs,
            Opcode::AnalogInputs => Command::AnalogInputs,
            Opcode::GetCanbusParams => Command::GetCanbusParams,
            Opcode::GetDeviceInfo => Command::GetDeviceInfo,
            Opcode::Keepalive => Command::Keepalive,
            Opcode::GetNumBuses => Command::GetNumBuses,
            Opcode::GetExtBuses => Command::GetExtBuses,
        };
        Some(Event::Command(command))
    }

    fn finish_frame(&mut self, assembly: &FrameAssembly, received: u8) -> Option<Event> {
        let computed = assembly.digest.finalize();
        self.last_checksum = Some(computed);
        if self.policy == ChecksumPolicy::Enforce && computed != received {
            return Some(Event::ChecksumRejected { computed, received });
        }
        let frame = assembly.frame();
        match assembly.purpose {
            FramePurpose::Echo => Some(Event::Command(Command::Echo(
                frame.with_bus(BusIndex::Can0),
            ))),
            FramePurpose::Transmit => match BusIndex::from_index(assembly.bus) {
                Some(bus) => Some(Event::Command(Command::Transmit(frame.with_bus(bus)))),
                None => Some(Event::UnroutableFrame { bus: assembly.bus }),
            },
        }
    }
}
