//! Keyboard input for screenform.
//!
//! This module turns raw terminal bytes into [`KeyEvent`]s. Escape
//! sequences are matched with a trie so that every prefix of a known
//! sequence can be recognised while it is still arriving.
//!
//! # Safety
//!
//! [`KeyReader`] uses `libc::select` and `libc::read` on a raw file
//! descriptor. The descriptor is owned by the caller and must stay open for
//! the lifetime of the reader.

use crate::error::{Error, Result};
use crate::key::{KeyCode, KeyEvent, Modifiers};
use std::collections::VecDeque;
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Size of the pushback FIFO.
const FIFO_SIZE: usize = 256;

/// Source of key presses for the form's input loop.
pub trait KeySource {
    /// Block until the next key press is available and return it.
    fn read_key(&mut self) -> Result<KeyEvent>;

    /// Check without blocking whether a key press is waiting.
    fn key_available(&mut self) -> bool;
}

/// Escape sequence matching result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EscapeMatch {
    /// Complete match found.
    Complete(KeyEvent),
    /// Partial match - need more input.
    Partial,
    /// No match possible.
    None,
}

/// Trie node for escape sequence matching.
#[derive(Clone, Debug, Default)]
struct TrieNode {
    /// Children nodes indexed by byte.
    children: Vec<(u8, Box<TrieNode>)>,
    /// Key if this is a terminal node.
    key: Option<KeyEvent>,
}

impl TrieNode {
    fn insert(&mut self, sequence: &[u8], key: KeyEvent) {
        let Some((&ch, rest)) = sequence.split_first() else {
            self.key = Some(key);
            return;
        };

        let pos = match self.children.iter().position(|(c, _)| *c == ch) {
            Some(pos) => pos,
            None => {
                self.children.push((ch, Box::default()));
                self.children.len() - 1
            }
        };
        self.children[pos].1.insert(rest, key);
    }

    fn find(&self, ch: u8) -> Option<&TrieNode> {
        self.children
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, node)| node.as_ref())
    }

    fn walk(&self, sequence: &[u8]) -> Option<&TrieNode> {
        sequence.iter().try_fold(self, |node, &c| node.find(c))
    }
}

/// Escape sequence parser using a trie for efficient matching.
pub struct EscapeParser {
    /// Root of the trie.
    root: TrieNode,
    /// Bytes fed since the last reset.
    current: Vec<u8>,
}

impl EscapeParser {
    /// Create a new escape parser with the common xterm/VT sequences.
    pub fn new() -> Self {
        let mut parser = Self {
            root: TrieNode::default(),
            current: Vec::with_capacity(16),
        };
        parser.add_default_sequences();
        parser
    }

    /// Add default escape sequences for common terminals.
    fn add_default_sequences(&mut self) {
        let plain = |code| KeyEvent::plain(code);

        // Cursor keys: normal, application mode, and xterm modified forms.
        for (final_byte, code) in [
            (b'A', KeyCode::Up),
            (b'B', KeyCode::Down),
            (b'C', KeyCode::Right),
            (b'D', KeyCode::Left),
            (b'H', KeyCode::Home),
            (b'F', KeyCode::End),
        ] {
            self.add(&[0x1b, b'[', final_byte], plain(code));
            self.add(&[0x1b, b'O', final_byte], plain(code));
            for m in 2..=8u8 {
                let seq = format!("\x1b[1;{}{}", m, final_byte as char);
                self.add(seq.as_bytes(), KeyEvent::new(code, Modifiers::from_xterm(m)));
            }
        }

        // F1-F4 in SS3 form and their modified CSI form.
        for (final_byte, n) in [(b'P', 1), (b'Q', 2), (b'R', 3), (b'S', 4)] {
            self.add(&[0x1b, b'O', final_byte], plain(KeyCode::F(n)));
            for m in 2..=8u8 {
                let seq = format!("\x1b[1;{}{}", m, final_byte as char);
                self.add(seq.as_bytes(), KeyEvent::new(KeyCode::F(n), Modifiers::from_xterm(m)));
            }
        }

        // VT220-style `ESC [ n ~` keys.
        for (n, code) in [
            (1, KeyCode::Home),
            (2, KeyCode::Insert),
            (3, KeyCode::Delete),
            (4, KeyCode::End),
            (5, KeyCode::PageUp),
            (6, KeyCode::PageDown),
            (7, KeyCode::Home),
            (8, KeyCode::End),
            (11, KeyCode::F(1)),
            (12, KeyCode::F(2)),
            (13, KeyCode::F(3)),
            (14, KeyCode::F(4)),
            (15, KeyCode::F(5)),
            (17, KeyCode::F(6)),
            (18, KeyCode::F(7)),
            (19, KeyCode::F(8)),
            (20, KeyCode::F(9)),
            (21, KeyCode::F(10)),
            (23, KeyCode::F(11)),
            (24, KeyCode::F(12)),
        ] {
            self.add(format!("\x1b[{}~", n).as_bytes(), plain(code));
            for m in 2..=8u8 {
                let seq = format!("\x1b[{};{}~", n, m);
                self.add(seq.as_bytes(), KeyEvent::new(code, Modifiers::from_xterm(m)));
            }
        }

        // Linux console F1-F5.
        for (final_byte, n) in [(b'A', 1), (b'B', 2), (b'C', 3), (b'D', 4), (b'E', 5)] {
            self.add(&[0x1b, b'[', b'[', final_byte], plain(KeyCode::F(n)));
        }

        // Back-tab
        self.add(b"\x1b[Z", plain(KeyCode::BackTab));
    }

    /// Add an escape sequence mapping, replacing any previous one.
    pub fn add(&mut self, sequence: &[u8], key: KeyEvent) {
        if !sequence.is_empty() {
            self.root.insert(sequence, key);
        }
    }

    /// Reset the parser state.
    pub fn reset(&mut self) {
        self.current.clear();
    }

    /// Feed a byte to the parser.
    pub fn feed(&mut self, ch: u8) -> EscapeMatch {
        self.current.push(ch);

        let Some(node) = self.root.walk(&self.current) else {
            self.current.clear();
            return EscapeMatch::None;
        };

        match node.key {
            Some(key) if node.children.is_empty() => {
                self.current.clear();
                EscapeMatch::Complete(key)
            }
            _ => EscapeMatch::Partial,
        }
    }

    /// Get the key matched by the bytes fed so far, if they form a complete sequence.
    pub fn current_match(&self) -> Option<KeyEvent> {
        self.root.walk(&self.current).and_then(|node| node.key)
    }

    /// Get the current accumulated input.
    pub fn current_input(&self) -> &[u8] {
        &self.current
    }

    /// Look up a complete sequence without touching parser state.
    pub fn lookup(&self, sequence: &[u8]) -> Option<KeyEvent> {
        self.root.walk(sequence).and_then(|node| node.key)
    }
}

impl Default for EscapeParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a single non-escape byte into a key press.
fn decode_control(byte: u8) -> Option<KeyEvent> {
    let key = match byte {
        b'\t' => KeyEvent::plain(KeyCode::Tab),
        b'\r' | b'\n' => KeyEvent::plain(KeyCode::Enter),
        0x7f | 0x08 => KeyEvent::plain(KeyCode::Backspace),
        0x00 => KeyEvent::ctrl(KeyCode::Char(' ')),
        0x01..=0x1a => KeyEvent::ctrl(KeyCode::Char((byte - 1 + b'a') as char)),
        0x1c..=0x1f => KeyEvent::ctrl(KeyCode::Char((byte + b'@') as char)),
        0x20..=0x7e => KeyEvent::char(byte as char),
        _ => return None,
    };
    Some(key)
}

/// Number of continuation bytes announced by a UTF-8 lead byte.
fn utf8_continuations(lead: u8) -> Option<usize> {
    if lead & 0xE0 == 0xC0 {
        Some(1)
    } else if lead & 0xF0 == 0xE0 {
        Some(2)
    } else if lead & 0xF8 == 0xF0 {
        Some(3)
    } else {
        None
    }
}

/// Key reader decoding bytes from a terminal file descriptor.
pub struct KeyReader {
    /// Input file descriptor.
    fd: RawFd,
    /// Bytes read ahead and pushed back.
    pending: VecDeque<u8>,
    /// Escape sequence parser.
    parser: EscapeParser,
    /// How long to wait for the rest of an escape sequence.
    escape_delay: Duration,
}

impl KeyReader {
    /// Create a reader on the given file descriptor.
    pub fn new(fd: RawFd, escape_delay_ms: u64) -> Self {
        Self {
            fd,
            pending: VecDeque::with_capacity(FIFO_SIZE),
            parser: EscapeParser::new(),
            escape_delay: Duration::from_millis(escape_delay_ms),
        }
    }

    /// Create a reader on standard input.
    pub fn from_stdin(escape_delay_ms: u64) -> Self {
        Self::new(libc::STDIN_FILENO, escape_delay_ms)
    }

    /// Access the escape parser, e.g. to add terminal-specific sequences.
    pub fn parser_mut(&mut self) -> &mut EscapeParser {
        &mut self.parser
    }

    /// Wait until the descriptor is readable. `None` waits forever.
    fn wait_readable(&self, timeout: Option<Duration>) -> Result<bool> {
        // SAFETY: `fd_set` is zero-initialised and then populated with
        // FD_ZERO/FD_SET for our descriptor only. All pointers handed to
        // `select` refer to live stack variables; a null timeout pointer
        // requests an indefinite wait.
        let result = unsafe {
            let mut fds = MaybeUninit::<libc::fd_set>::zeroed().assume_init();
            libc::FD_ZERO(&mut fds);
            libc::FD_SET(self.fd, &mut fds);

            let mut tv = timeout.map(|t| libc::timeval {
                tv_sec: t.as_secs() as libc::time_t,
                tv_usec: t.subsec_micros() as libc::suseconds_t,
            });
            let tv_ptr = tv
                .as_mut()
                .map_or(std::ptr::null_mut(), |tv| tv as *mut libc::timeval);

            libc::select(
                self.fd + 1,
                &mut fds,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                tv_ptr,
            )
        };

        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(Error::SystemError(err.raw_os_error().unwrap_or(-1)));
        }
        Ok(result > 0)
    }

    /// Read one byte from the descriptor. `None` means end of file.
    fn read_raw(&self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        // SAFETY: `buf` is a live 1-byte stack buffer and the length passed
        // to `read` matches it exactly.
        let result = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, 1) };

        if result > 0 {
            Ok(Some(buf[0]))
        } else if result == 0 {
            Ok(None)
        } else {
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                _ => Err(Error::SystemError(err.raw_os_error().unwrap_or(-1))),
            }
        }
    }

    /// Next byte, waiting at most `timeout` (forever when `None`).
    fn next_byte(&mut self, timeout: Option<Duration>) -> Result<Option<u8>> {
        if let Some(b) = self.pending.pop_front() {
            return Ok(Some(b));
        }
        loop {
            if self.wait_readable(timeout)? {
                return self.read_raw();
            }
            if timeout.is_some() {
                return Ok(None);
            }
        }
    }

    fn push_back(&mut self, bytes: &[u8]) {
        for &b in bytes.iter().rev() {
            if self.pending.len() < FIFO_SIZE {
                self.pending.push_front(b);
            }
        }
    }

    /// Parse an escape sequence after receiving ESC.
    fn parse_escape(&mut self) -> Result<KeyEvent> {
        self.parser.reset();
        self.parser.feed(0x1b);
        let mut seen = vec![0x1b];

        loop {
            let Some(byte) = self.next_byte(Some(self.escape_delay))? else {
                // Timed out or EOF: settle for what we have.
                if let Some(key) = self.parser.current_match() {
                    self.parser.reset();
                    return Ok(key);
                }
                self.parser.reset();
                self.push_back(&seen[1..]);
                return Ok(KeyEvent::plain(KeyCode::Esc));
            };
            seen.push(byte);

            match self.parser.feed(byte) {
                EscapeMatch::Complete(key) => return Ok(key),
                EscapeMatch::Partial => {}
                EscapeMatch::None => {
                    // ESC followed by a plain key is the Alt-prefixed key.
                    if seen.len() == 2 {
                        if let Some(key) = decode_control(byte) {
                            return Ok(KeyEvent::new(key.code, key.modifiers | Modifiers::ALT));
                        }
                    }
                    self.push_back(&seen[1..]);
                    return Ok(KeyEvent::plain(KeyCode::Esc));
                }
            }
        }
    }

    /// Decode a UTF-8 sequence starting with `lead`.
    fn decode_utf8(&mut self, lead: u8) -> Result<Option<KeyEvent>> {
        let Some(needed) = utf8_continuations(lead) else {
            return Ok(None);
        };
        let mut bytes = vec![lead];
        for _ in 0..needed {
            match self.next_byte(Some(self.escape_delay))? {
                Some(b) if b & 0xC0 == 0x80 => bytes.push(b),
                Some(b) => {
                    self.push_back(&[b]);
                    break;
                }
                None => break,
            }
        }
        Ok(std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .map(KeyEvent::char))
    }
}

impl KeySource for KeyReader {
    fn read_key(&mut self) -> Result<KeyEvent> {
        loop {
            let byte = self.next_byte(None)?.ok_or(Error::Eof)?;
            let key = match byte {
                0x1b => Some(self.parse_escape()?),
                0x80..=0xff => self.decode_utf8(byte)?,
                _ => decode_control(byte),
            };
            if let Some(key) = key {
                tracing::trace!(%key, "key read");
                return Ok(key);
            }
        }
    }

    fn key_available(&mut self) -> bool {
        !self.pending.is_empty() || self.wait_readable(Some(Duration::ZERO)).unwrap_or(false)
    }
}

/// A prerecorded queue of key presses, for tests and scripted sessions.
#[derive(Clone, Debug, Default)]
pub struct ScriptedKeys {
    keys: VecDeque<KeyEvent>,
}

impl ScriptedKeys {
    /// Create a script from a sequence of keys.
    pub fn new(keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Append a key.
    pub fn push(&mut self, key: KeyEvent) -> &mut Self {
        self.keys.push_back(key);
        self
    }

    /// Append one key press per character of `text`.
    pub fn type_text(&mut self, text: &str) -> &mut Self {
        self.keys.extend(text.chars().map(KeyEvent::char));
        self
    }

    /// Number of keys left.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl KeySource for ScriptedKeys {
    fn read_key(&mut self) -> Result<KeyEvent> {
        self.keys.pop_front().ok_or(Error::Eof)
    }

    fn key_available(&mut self) -> bool {
        !self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut EscapeParser, bytes: &[u8]) -> EscapeMatch {
        let mut last = EscapeMatch::None;
        for &b in bytes {
            last = parser.feed(b);
        }
        last
    }

    #[test]
    fn test_escape_parser() {
        let mut parser = EscapeParser::new();

        parser.reset();
        assert_eq!(parser.feed(0x1b), EscapeMatch::Partial);
        assert_eq!(parser.feed(b'['), EscapeMatch::Partial);
        assert_eq!(
            parser.feed(b'A'),
            EscapeMatch::Complete(KeyEvent::plain(KeyCode::Up))
        );
    }

    #[test]
    fn test_modified_sequences() {
        let mut parser = EscapeParser::new();
        assert_eq!(
            feed_all(&mut parser, b"\x1b[1;5C"),
            EscapeMatch::Complete(KeyEvent::ctrl(KeyCode::Right))
        );
        assert_eq!(
            feed_all(&mut parser, b"\x1b[5;2~"),
            EscapeMatch::Complete(KeyEvent::shift(KeyCode::PageUp))
        );
        assert_eq!(
            parser.lookup(b"\x1b[24~"),
            Some(KeyEvent::plain(KeyCode::F(12)))
        );
        assert_eq!(parser.lookup(b"\x1b[Z"), Some(KeyEvent::plain(KeyCode::BackTab)));
    }

    #[test]
    fn test_unknown_sequence() {
        let mut parser = EscapeParser::new();
        assert_eq!(feed_all(&mut parser, b"\x1b[9"), EscapeMatch::None);
        assert!(parser.current_input().is_empty());
    }

    #[test]
    fn test_custom_sequence() {
        let mut parser = EscapeParser::new();
        parser.add(b"\x1b[200~", KeyEvent::plain(KeyCode::Insert));
        assert_eq!(parser.lookup(b"\x1b[200~"), Some(KeyEvent::plain(KeyCode::Insert)));
    }

    #[test]
    fn test_decode_control() {
        assert_eq!(decode_control(b'\t'), Some(KeyEvent::plain(KeyCode::Tab)));
        assert_eq!(decode_control(b'\r'), Some(KeyEvent::plain(KeyCode::Enter)));
        assert_eq!(decode_control(0x7f), Some(KeyEvent::plain(KeyCode::Backspace)));
        assert_eq!(decode_control(0x01), Some(KeyEvent::ctrl(KeyCode::Char('a'))));
        assert_eq!(decode_control(b'z'), Some(KeyEvent::char('z')));
    }

    #[test]
    fn test_scripted_keys() {
        let mut keys = ScriptedKeys::default();
        keys.type_text("ab").push(KeyEvent::plain(KeyCode::Tab));
        assert_eq!(keys.remaining(), 3);
        assert_eq!(keys.read_key().unwrap(), KeyEvent::char('a'));
        assert_eq!(keys.read_key().unwrap(), KeyEvent::char('b'));
        assert!(keys.key_available());
        assert_eq!(keys.read_key().unwrap(), KeyEvent::plain(KeyCode::Tab));
        assert_eq!(keys.read_key(), Err(Error::Eof));
    }

    fn pipe_reader(bytes: &[u8]) -> (KeyReader, RawFd) {
        let mut fds = [0 as libc::c_int; 2];
        // SAFETY: `fds` is a live two-element array as `pipe` requires.
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(rc, 0);
        // SAFETY: the write end is open and `bytes` is a valid slice.
        let written =
            unsafe { libc::write(fds[1], bytes.as_ptr() as *const libc::c_void, bytes.len()) };
        assert_eq!(written as usize, bytes.len());
        (KeyReader::new(fds[0], 20), fds[1])
    }

    #[test]
    fn test_reader_decodes_stream() {
        let (mut reader, write_end) = pipe_reader("a\x1b[1;5D\x1bOP\u{e9}\x1bx".as_bytes());
        assert_eq!(reader.read_key().unwrap(), KeyEvent::char('a'));
        assert_eq!(reader.read_key().unwrap(), KeyEvent::ctrl(KeyCode::Left));
        assert_eq!(reader.read_key().unwrap(), KeyEvent::plain(KeyCode::F(1)));
        assert_eq!(reader.read_key().unwrap(), KeyEvent::char('\u{e9}'));
        assert_eq!(reader.read_key().unwrap(), KeyEvent::alt(KeyCode::Char('x')));
        // SAFETY: closing the write end we own yields EOF on the read end.
        unsafe { libc::close(write_end) };
        assert_eq!(reader.read_key(), Err(Error::Eof));
    }

    #[test]
    fn test_reader_lone_escape() {
        let (mut reader, write_end) = pipe_reader(b"\x1b");
        assert_eq!(reader.read_key().unwrap(), KeyEvent::plain(KeyCode::Esc));
        // SAFETY: see above.
        unsafe { libc::close(write_end) };
    }
}
