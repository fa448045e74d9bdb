//! RESP framing for the dump file
//!
//! A command of N arguments is written as an array header `*N\r\n` followed by
//! each argument as a bulk string `$<len>\r\n<bytes>\r\n`, where `<len>` is the
//! UTF-8 byte length. The result is byte-for-byte what `redis-cli --pipe`
//! expects.

use crate::types::Command;

pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut frame = Vec::with_capacity(frame_len(command));
    write_command(&mut frame, command);
    frame
}

pub fn encode_commands(commands: &[Command]) -> Vec<u8> {
    let mut frames = Vec::with_capacity(commands.iter().map(frame_len).sum());
    for command in commands {
        write_command(&mut frames, command);
    }
    frames
}

fn write_command(out: &mut Vec<u8>, command: &Command) {
    out.push(b'*');
    out.extend_from_slice(command.len().to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
    for arg in command.as_slice() {
        let bytes = arg.as_bytes();
        out.push(b'$');
        out.extend_from_slice(bytes.len().to_string().as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(bytes);
        out.extend_from_slice(b"\r\n");
    }
}

// Upper bound used only to size the buffer
fn frame_len(command: &Command) -> usize {
    16 + command
        .as_slice()
        .iter()
        .map(|arg| arg.len() + 24)
        .sum::<usize>()
}
