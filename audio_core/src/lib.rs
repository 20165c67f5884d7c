//! Audio helpers for the chat harness: WAV container inspection, WAV
//! encoding for fixtures and inline payloads, and local playback backends.

pub mod player;
pub mod wav;

pub use player::{player_for_os, system_player, AudioPlayer, CommandPlayer, SilentPlayer};
pub use wav::{decode_base64_audio, encode_wav, encode_wav_base64, inspect_wav, WavDetails};
