use crate::model::{Model, Pack};
use crate::{ModelError, MAX_SUCCESSOR_N};

/// Emits `model` in the C-header form produced by the original model
/// generator, bit-compatible with its table dumps.
pub fn write_header(model: &Model) -> String {
    let count = model.leader_count();
    let successors = model.successors_count();
    let rows = model.max_char() - model.min_char();

    let mut out = String::new();

    out.push_str(&format!("#define MIN_CHR {}\n", model.min_char()));
    out.push_str(&format!("#define MAX_CHR {}\n\n", model.max_char()));

    out.push_str(&format!("static const char chrs_by_chr_id[{count}] = {{\n"));
    for line in model.chars_by_id().chunks(16) {
        out.push_str(&format!("  {},\n", join(line.iter().map(|&chr| char_literal(chr)))));
    }
    out.push_str("};\n\n");

    out.push_str("static const int8_t chr_ids_by_chr[256] = {\n");
    for row in 0..256 / 16 {
        let ids = (0..16).map(|col| id_literal(model.id_by_char((row * 16 + col) as u8)));
        out.push_str(&format!("  {},\n", join(ids)));
    }
    out.push_str("};\n\n");

    out.push_str(&format!(
        "static const int8_t successor_ids_by_chr_id_and_chr_id[{count}][{count}] = {{\n"
    ));
    for leader_id in 0..count {
        let ranks =
            (0..count).map(|follower_id| id_literal(model.successor_id(leader_id as u8, follower_id as u8)));
        out.push_str(&format!("  {{{}}},\n", join(ranks)));
    }
    out.push_str("};\n\n");

    out.push_str(&format!(
        "static const int8_t chrs_by_chr_and_successor_id[{rows}][{successors}] = {{\n"
    ));
    for row in 0..rows {
        let chr = (model.min_char() + row) as u8;
        let chars = (0..successors).map(|rank| char_literal(model.successor_char(chr, rank)));
        out.push_str(&format!("  {{{}}},\n", join(chars)));
    }
    out.push_str("};\n\n");

    out.push_str(&format!("#define PACK_COUNT {}\n", model.packs().len()));
    out.push_str(&format!("#define MAX_SUCCESSOR_N {MAX_SUCCESSOR_N}\n\n"));

    out.push_str("static const Pack packs[PACK_COUNT] = {\n");
    for pack in model.packs() {
        out.push_str(&pack_row(pack));
    }
    out.push_str("};\n");

    out
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

fn char_literal(byte: u8) -> String {
    match byte {
        b'\t' => "'\\t'".to_owned(),
        b'\n' => "'\\n'".to_owned(),
        b'\r' => "'\\r'".to_owned(),
        b'\\' => "'\\\\'".to_owned(),
        b'\'' => "'\\''".to_owned(),
        0x20..=0x7E => format!("'{}'", byte as char),
        _ => format!("'\\x{byte:02x}'"),
    }
}

fn id_literal(id: u8) -> String {
    (id as i8).to_string()
}

fn pack_row(pack: &Pack) -> String {
    let mut offsets = pack.offsets.clone();
    let mut masks = pack.masks.clone();
    offsets.resize(MAX_SUCCESSOR_N + 1, *pack.offsets.last().unwrap());
    masks.resize(MAX_SUCCESSOR_N + 1, 0);

    format!(
        "  {{ 0x{:08x}, {}, {}, {{ {} }}, {{ {} }}, 0x{:02x}, 0x{:02x} }},\n",
        pack.word,
        pack.bytes_packed,
        pack.bytes_unpacked,
        join(offsets.iter().map(u32::to_string)),
        join(masks.iter().map(u32::to_string)),
        pack.header_mask,
        pack.header
    )
}

/// Parses a model back out of the C-header textual form.
///
/// Tolerates the standard C character escapes and negative table entries
/// (`-1` stands for 0xFF). Text-level problems surface as
/// [`ModelError::HeaderParse`]; the assembled tables then run through the
/// usual model validation.
pub fn read_header(text: &str) -> Result<Model, ModelError> {
    let min_char = parse_define(text, "MIN_CHR")?;
    let max_char = parse_define(text, "MAX_CHR")?;
    let pack_count = parse_define(text, "PACK_COUNT")?;
    let max_successor_n = parse_define(text, "MAX_SUCCESSOR_N")?;

    if max_successor_n != MAX_SUCCESSOR_N as i64 {
        return Err(ModelError::HeaderParse(format!(
            "unsupported MAX_SUCCESSOR_N {max_successor_n}"
        )));
    }
    if min_char < 0 || max_char < min_char || max_char > 256 {
        return Err(ModelError::HeaderParse(format!(
            "invalid character range {min_char}..{max_char}"
        )));
    }

    let chars_by_id = flat_bytes(table(text, "chrs_by_chr_id")?)?;
    let ids_by_char = flat_bytes(table(text, "chr_ids_by_chr")?)?;

    let successor_rows = byte_rows(table(text, "successor_ids_by_chr_id_and_chr_id")?)?;
    let successor_ids = flatten_uniform(&successor_rows, "successor id")?;

    let char_rows = byte_rows(table(text, "chrs_by_chr_and_successor_id")?)?;
    let successors_count = match char_rows.first() {
        Some(row) => row.len(),
        None => {
            return Err(ModelError::HeaderParse(
                "the successor character table is empty".to_owned(),
            ))
        }
    };
    let chars_by_successor_id = flatten_uniform(&char_rows, "successor character")?;

    let pack_items = table(text, "packs")?;
    if pack_items.len() != pack_count as usize {
        return Err(ModelError::HeaderParse(format!(
            "PACK_COUNT {pack_count} disagrees with {} pack rows",
            pack_items.len()
        )));
    }
    let packs = pack_items
        .iter()
        .map(parse_pack)
        .collect::<Result<Vec<_>, _>>()?;

    Model::from_tables(
        min_char as usize,
        max_char as usize,
        chars_by_id,
        ids_by_char,
        successor_ids,
        chars_by_successor_id,
        successors_count,
        packs,
    )
}

#[derive(Clone, Debug, PartialEq)]
enum Item {
    Value(i64),
    Group(Vec<Item>),
}

fn parse_define(text: &str, name: &str) -> Result<i64, ModelError> {
    for line in text.lines() {
        let Some(rest) = line.trim_start().strip_prefix("#define") else {
            continue;
        };
        let mut parts = rest.split_whitespace();
        if parts.next() != Some(name) {
            continue;
        }
        let Some(value) = parts.next() else {
            return Err(ModelError::HeaderParse(format!("#define {name} has no value")));
        };
        return value
            .parse()
            .map_err(|_| ModelError::HeaderParse(format!("#define {name} value {value} is not an integer")));
    }
    Err(ModelError::HeaderParse(format!("missing #define {name}")))
}

/// Locates the initializer block of the named table and parses it into
/// its top-level items.
fn table(text: &str, name: &str) -> Result<Vec<Item>, ModelError> {
    let mut search = 0;
    let at = loop {
        let Some(found) = text[search..].find(name) else {
            return Err(ModelError::HeaderParse(format!("missing table {name}")));
        };
        let at = search + found;
        let boundary_before = at == 0
            || !text.as_bytes()[at - 1].is_ascii_alphanumeric() && text.as_bytes()[at - 1] != b'_';
        let after = at + name.len();
        let boundary_after = after >= text.len()
            || !text.as_bytes()[after].is_ascii_alphanumeric() && text.as_bytes()[after] != b'_';
        if boundary_before && boundary_after {
            break at;
        }
        search = at + name.len();
    };

    let rest = &text[at + name.len()..];
    let Some(equals) = rest.find('=') else {
        return Err(ModelError::HeaderParse(format!("table {name} has no initializer")));
    };

    let mut scanner = Scanner::new(&rest[equals + 1..], name);
    match scanner.parse_item()? {
        Item::Group(items) => Ok(items),
        Item::Value(_) => Err(ModelError::HeaderParse(format!(
            "table {name} is not a braced initializer"
        ))),
    }
}

fn value_as_byte(value: i64, what: &str) -> Result<u8, ModelError> {
    if !(-256..256).contains(&value) {
        return Err(ModelError::HeaderParse(format!(
            "{what} value {value} does not fit a byte"
        )));
    }
    Ok(((value + 256) % 256) as u8)
}

fn flat_bytes(items: Vec<Item>) -> Result<Vec<u8>, ModelError> {
    items
        .into_iter()
        .map(|item| match item {
            Item::Value(value) => value_as_byte(value, "table"),
            Item::Group(_) => Err(ModelError::HeaderParse(
                "unexpected nested braces in a flat table".to_owned(),
            )),
        })
        .collect()
}

fn byte_rows(items: Vec<Item>) -> Result<Vec<Vec<u8>>, ModelError> {
    items
        .into_iter()
        .map(|item| match item {
            Item::Group(row) => flat_bytes(row),
            Item::Value(_) => Err(ModelError::HeaderParse(
                "expected a braced row in a two-dimensional table".to_owned(),
            )),
        })
        .collect()
}

fn flatten_uniform(rows: &[Vec<u8>], what: &str) -> Result<Vec<u8>, ModelError> {
    let width = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != width) {
        return Err(ModelError::HeaderParse(format!(
            "ragged rows in the {what} table"
        )));
    }
    Ok(rows.concat())
}

fn parse_pack(item: &Item) -> Result<Pack, ModelError> {
    let Item::Group(fields) = item else {
        return Err(ModelError::HeaderParse("a pack row is not braced".to_owned()));
    };
    let [Item::Value(word), Item::Value(bytes_packed), Item::Value(bytes_unpacked), Item::Group(offsets), Item::Group(masks), Item::Value(header_mask), Item::Value(header)] =
        fields.as_slice()
    else {
        return Err(ModelError::HeaderParse(
            "a pack row does not match { word, packed, unpacked, { offsets }, { masks }, header mask, header }"
                .to_owned(),
        ));
    };

    if !(0..=u32::MAX as i64).contains(word) {
        return Err(ModelError::HeaderParse(format!(
            "pack word {word:#x} does not fit 32 bits"
        )));
    }
    let bytes_unpacked = usize::try_from(*bytes_unpacked)
        .map_err(|_| ModelError::HeaderParse(format!("invalid unpacked count {bytes_unpacked}")))?;
    let bytes_packed = usize::try_from(*bytes_packed)
        .map_err(|_| ModelError::HeaderParse(format!("invalid packed count {bytes_packed}")))?;
    if offsets.len() < bytes_unpacked || masks.len() < bytes_unpacked {
        return Err(ModelError::HeaderParse(format!(
            "a pack row carries fewer than {bytes_unpacked} offsets or masks"
        )));
    }

    let field = |items: &[Item], what: &str| -> Result<Vec<u32>, ModelError> {
        items[..bytes_unpacked]
            .iter()
            .map(|item| match item {
                Item::Value(value) if (0..=u32::MAX as i64).contains(value) => Ok(*value as u32),
                _ => Err(ModelError::HeaderParse(format!("invalid pack {what} entry"))),
            })
            .collect()
    };

    Ok(Pack {
        word: *word as u32,
        bytes_packed,
        bytes_unpacked,
        offsets: field(offsets, "offset")?,
        masks: field(masks, "mask")?,
        header_mask: value_as_byte(*header_mask, "pack header mask")?,
        header: value_as_byte(*header, "pack header")?,
    })
}

/// Cursor over one table initializer. Understands nested braces, decimal
/// and hexadecimal integers, and C character literals.
struct Scanner<'a> {
    bytes: &'a [u8],
    position: usize,
    table: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, table: &'a str) -> Self {
        Scanner {
            bytes: text.as_bytes(),
            position: 0,
            table,
        }
    }

    fn fail(&self, message: &str) -> ModelError {
        ModelError::HeaderParse(format!("{message} in table {}", self.table))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek();
        if byte.is_some() {
            self.position += 1;
        }
        byte
    }

    fn expect(&mut self, byte: u8) -> Result<(), ModelError> {
        if self.bump() != Some(byte) {
            return Err(self.fail(&format!("expected '{}'", byte as char)));
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    fn parse_item(&mut self) -> Result<Item, ModelError> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => self.parse_group().map(Item::Group),
            Some(b'\'') => self.parse_char_literal().map(|byte| Item::Value(byte as i64)),
            Some(byte) if byte == b'-' || byte.is_ascii_digit() => {
                self.parse_number().map(Item::Value)
            }
            _ => Err(self.fail("expected a value")),
        }
    }

    fn parse_group(&mut self) -> Result<Vec<Item>, ModelError> {
        self.expect(b'{')?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b'}') {
                self.position += 1;
                return Ok(items);
            }
            items.push(self.parse_item()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.position += 1;
                }
                Some(b'}') => {}
                _ => return Err(self.fail("expected ',' or '}'")),
            }
        }
    }

    fn parse_number(&mut self) -> Result<i64, ModelError> {
        let negative = self.peek() == Some(b'-');
        if negative {
            self.position += 1;
        }

        let hex = self.peek() == Some(b'0')
            && matches!(self.bytes.get(self.position + 1), Some(b'x') | Some(b'X'));
        if hex {
            self.position += 2;
        }

        let start = self.position;
        while self
            .peek()
            .is_some_and(|byte| if hex { byte.is_ascii_hexdigit() } else { byte.is_ascii_digit() })
        {
            self.position += 1;
        }
        if start == self.position {
            return Err(self.fail("expected digits"));
        }

        let digits = std::str::from_utf8(&self.bytes[start..self.position]).unwrap();
        let value = i64::from_str_radix(digits, if hex { 16 } else { 10 })
            .map_err(|_| self.fail("integer out of range"))?;
        Ok(if negative { -value } else { value })
    }

    fn parse_char_literal(&mut self) -> Result<u8, ModelError> {
        self.expect(b'\'')?;
        let byte = match self.bump() {
            Some(b'\\') => self.parse_escape()?,
            Some(b'\'') => return Err(self.fail("empty character literal")),
            Some(byte) => byte,
            None => return Err(self.fail("unterminated character literal")),
        };
        self.expect(b'\'')?;
        Ok(byte)
    }

    fn parse_escape(&mut self) -> Result<u8, ModelError> {
        match self.bump() {
            Some(b'a') => Ok(0x07),
            Some(b'b') => Ok(0x08),
            Some(b'f') => Ok(0x0C),
            Some(b'n') => Ok(b'\n'),
            Some(b'r') => Ok(b'\r'),
            Some(b't') => Ok(b'\t'),
            Some(b'v') => Ok(0x0B),
            Some(b'\\') => Ok(b'\\'),
            Some(b'\'') => Ok(b'\''),
            Some(b'"') => Ok(b'"'),
            Some(b'?') => Ok(b'?'),
            Some(b'e') => Ok(0x1B),
            Some(b'x') => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while let Some(byte) = self.peek().filter(u8::is_ascii_hexdigit) {
                    value = value * 16 + (byte as char).to_digit(16).unwrap();
                    digits += 1;
                    self.position += 1;
                    if value > 0xFF {
                        return Err(self.fail("hex escape exceeds a byte"));
                    }
                }
                if digits == 0 {
                    return Err(self.fail("hex escape without digits"));
                }
                Ok(value as u8)
            }
            Some(byte @ b'0'..=b'7') => {
                let mut value = (byte - b'0') as u32;
                for _ in 0..2 {
                    let Some(byte) = self.peek().filter(|byte| (b'0'..=b'7').contains(byte)) else {
                        break;
                    };
                    value = value * 8 + (byte - b'0') as u32;
                    self.position += 1;
                }
                if value > 0xFF {
                    return Err(self.fail("octal escape exceeds a byte"));
                }
                Ok(value as u8)
            }
            _ => Err(self.fail("unknown escape sequence")),
        }
    }
}

#[cfg(test)]
mod tests;
