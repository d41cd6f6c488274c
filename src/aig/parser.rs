use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{Aig, AigEdge, Result, aig::error::ParserError};

fn read_u64(s: &str) -> std::result::Result<u64, ParserError> {
    s.parse::<u64>()
        .map_err(|_| ParserError::InvalidToken(s.to_string() + " expected u64"))
}

fn check_even(x: u64) -> Result<()> {
    if x & 1 == 1 {
        return Err(ParserError::InvalidToken(
            "expected literal to be even, got ".to_string() + &x.to_string(),
        )
        .into());
    }
    Ok(())
}

fn next_line(reader: &mut impl BufRead) -> std::result::Result<String, ParserError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(ParserError::InvalidToken(
            "unexpected end of file".to_string(),
        ));
    }
    Ok(line)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    m: u64,
    i: u64,
    l: u64,
    o: u64,
    a: u64,
}

impl TryFrom<&str> for Header {
    type Error = ParserError;

    fn try_from(line: &str) -> std::result::Result<Self, Self::Error> {
        let tokens = line.split_whitespace().collect::<Vec<&str>>();

        if tokens.len() < 6 {
            return Err(ParserError::InvalidToken(
                "missing header tokens".to_string(),
            ));
        }

        if tokens[0] != "aag" && tokens[0] != "aig" {
            return Err(ParserError::InvalidToken(
                "expected aag (or at least aig)".to_string(),
            ));
        }

        let m = read_u64(tokens[1])?;
        let i = read_u64(tokens[2])?;
        let l = read_u64(tokens[3])?;
        let o = read_u64(tokens[4])?;
        let a = read_u64(tokens[5])?;

        if tokens.len() > 6 {
            return Err(ParserError::UnsupportedFeature(
                "header only supports M I L O A".to_string(),
            ));
        }

        Ok(Header { m, i, l, o, a })
    }
}

impl Header {
    /// Binary files leave no gap between variables, so `M = I + L + A`.
    /// Also makes sure every literal (up to `2M + 1`) fits.
    fn check_binary(&self) -> std::result::Result<(), ParserError> {
        let total = self.i.checked_add(self.l).and_then(|x| x.checked_add(self.a));
        if total != Some(self.m) {
            return Err(ParserError::InvalidToken(format!(
                "expected M = I + L + A in binary header, got M={} I={} L={} A={}",
                self.m, self.i, self.l, self.a
            )));
        }
        if self.m.checked_mul(2).and_then(|x| x.checked_add(1)).is_none() {
            return Err(ParserError::InvalidToken(format!(
                "too many variables: {}",
                self.m
            )));
        }
        Ok(())
    }
}

/// Names given by the symbol table, indexed by position.
#[derive(Debug, Default)]
struct Symbols {
    inputs: HashMap<u64, String>,
    latches: HashMap<u64, String>,
    outputs: HashMap<u64, String>,
}

/// Everything read from an AIGER file, before building the AIG.
/// Variables are AIGER variables, literals are AIGER literals (`2 * var + complement`).
#[derive(Debug, Default)]
struct Description {
    /// Variables.
    inputs: Vec<u64>,
    /// Variable, next state literal, init.
    latches: Vec<(u64, u64, Option<bool>)>,
    /// Literals.
    outputs: Vec<u64>,
    /// Variable, fanin0 literal, fanin1 literal.
    ands: Vec<(u64, u64, u64)>,
    symbols: Symbols,
    comments: Vec<String>,
}

/// Reads the symbol table and the comment section, which are the same for both formats.
fn read_symbols_and_comments(text: &str, header: Header) -> Result<(Symbols, Vec<String>)> {
    let mut symbols = Symbols::default();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        if line.trim_end() == "c" {
            let comments = lines.map(|l| l.to_string()).collect();
            return Ok((symbols, comments));
        }

        let (position, name) = line.split_once(' ').ok_or(ParserError::InvalidToken(
            "invalid symbol ".to_string() + line,
        ))?;
        let (table, bound) = match position.chars().next() {
            Some('i') => (&mut symbols.inputs, header.i),
            Some('l') => (&mut symbols.latches, header.l),
            Some('o') => (&mut symbols.outputs, header.o),
            _ => {
                return Err(ParserError::UnsupportedFeature(
                    "symbol kind of ".to_string() + line,
                )
                .into());
            }
        };
        let idx = read_u64(&position[1..])?;
        if idx >= bound {
            return Err(
                ParserError::InvalidToken("symbol index out of range: ".to_string() + line).into(),
            );
        }
        table.insert(idx, name.to_string());
    }

    Ok((symbols, Vec::new()))
}

fn lit_to_edge(edges: &HashMap<u64, AigEdge>, lit: u64) -> Result<AigEdge> {
    let edge = edges.get(&(lit >> 1)).ok_or(ParserError::InvalidToken(format!(
        "literal {} refers to an undefined variable",
        lit
    )))?;
    Ok(if lit & 1 == 1 { !*edge } else { *edge })
}

/// Creates the and gate defining `root`, creating first its fanins if needed.
///
/// AND definitions may come in any order (ASCII format), so we need to go through fanins first.
fn build_and(
    aig: &mut Aig,
    edges: &mut HashMap<u64, AigEdge>,
    defs: &HashMap<u64, (u64, u64)>,
    root: u64,
) -> Result<()> {
    let mut stack = vec![root];
    let mut in_progress = HashSet::new();

    while let Some(&var) = stack.last() {
        if edges.contains_key(&var) {
            stack.pop();
            continue;
        }

        let &(rhs0, rhs1) = defs.get(&var).ok_or(ParserError::InvalidToken(format!(
            "variable {} is never defined",
            var
        )))?;
        in_progress.insert(var);

        let pending: Vec<u64> = [rhs0 >> 1, rhs1 >> 1]
            .into_iter()
            .filter(|v| !edges.contains_key(v))
            .collect();

        if pending.is_empty() {
            let edge = aig.new_and(lit_to_edge(edges, rhs0)?, lit_to_edge(edges, rhs1)?)?;
            edges.insert(var, edge);
            in_progress.remove(&var);
            stack.pop();
        } else {
            for v in pending {
                if in_progress.contains(&v) {
                    return Err(ParserError::InvalidToken(format!(
                        "and gates definitions are cyclic through variable {}",
                        v
                    ))
                    .into());
                }
                stack.push(v);
            }
        }
    }

    Ok(())
}

/// Builder for both AIGER formats.
fn build_aig(mut desc: Description) -> Result<Aig> {
    let mut aig = Aig::new();
    let mut edges = HashMap::from([(0, AigEdge::FALSE)]);

    // Starting by inputs
    for (k, &var) in desc.inputs.iter().enumerate() {
        let name = desc
            .symbols
            .inputs
            .remove(&(k as u64))
            .unwrap_or_else(|| format!("i{}", k));
        let known = aig.get_inputs_id().len();
        let edge = aig.add_input(name.clone())?;
        if aig.get_inputs_id().len() == known {
            return Err(
                ParserError::InvalidToken(format!("input name {:?} used twice", name)).into(),
            );
        }
        if edges.insert(var, edge).is_some() {
            return Err(
                ParserError::InvalidToken(format!("variable {} defined twice", var)).into(),
            );
        }
    }

    // Adding latches, their next state is set once and gates exist
    let mut latches = Vec::new();
    for (k, &(var, next, init)) in desc.latches.iter().enumerate() {
        let name = desc
            .symbols
            .latches
            .remove(&(k as u64))
            .unwrap_or_else(|| format!("l{}", k));
        let edge = aig.add_latch(name, init)?;
        if edges.insert(var, edge).is_some() {
            return Err(
                ParserError::InvalidToken(format!("variable {} defined twice", var)).into(),
            );
        }
        latches.push((edge, next));
    }

    // Adding and gates
    let mut defs = HashMap::new();
    for &(var, rhs0, rhs1) in &desc.ands {
        if edges.contains_key(&var) || defs.insert(var, (rhs0, rhs1)).is_some() {
            return Err(
                ParserError::InvalidToken(format!("variable {} defined twice", var)).into(),
            );
        }
    }
    for &(var, _, _) in &desc.ands {
        build_and(&mut aig, &mut edges, &defs, var)?;
    }

    // Edit the next state of the latches
    for (latch, next) in latches {
        aig.set_latch_next(latch.get_node_id(), lit_to_edge(&edges, next)?)?;
    }

    // Marking outputs
    for (k, &lit) in desc.outputs.iter().enumerate() {
        let name = desc
            .symbols
            .outputs
            .remove(&(k as u64))
            .unwrap_or_else(|| format!("o{}", k));
        aig.add_output(name, lit_to_edge(&edges, lit)?)?;
    }

    for comment in desc.comments {
        aig.add_comment(comment);
    }

    Ok(aig)
}

/// Parser for the ASCII AIGER format.
mod ascii {
    use std::io::{BufReader, Read};

    use super::{
        Description, Header, build_aig, check_even, next_line, read_symbols_and_comments, read_u64,
    };
    use crate::{Aig, Result, aig::error::ParserError};

    pub(super) fn read_input(line: &str) -> Result<u64> {
        let tokens = line.split_whitespace().collect::<Vec<&str>>();

        if tokens.is_empty() {
            return Err(
                ParserError::InvalidToken("expected input token, got nothing".to_string()).into(),
            );
        }

        if tokens.len() > 1 {
            return Err(ParserError::InvalidToken(
                "expected nothing after input, got ".to_string() + tokens[1],
            )
            .into());
        }

        let i = read_u64(tokens[0])?;
        check_even(i)?;
        Ok(i >> 1)
    }

    pub(super) fn read_latch(line: &str) -> Result<(u64, u64, Option<bool>)> {
        let tokens = line.split_whitespace().collect::<Vec<&str>>();

        if tokens.len() < 2 {
            return Err(ParserError::InvalidToken("not enough latch tokens".to_string()).into());
        }

        if tokens.len() > 3 {
            return Err(ParserError::InvalidToken(
                "expected nothing after latch, got ".to_string() + tokens[3],
            )
            .into());
        }

        let lit = read_u64(tokens[0])?;
        let next = read_u64(tokens[1])?;
        let init = if tokens.len() > 2 {
            let res = read_u64(tokens[2])?;
            if res == 0 {
                Ok(Some(false))
            } else if res == 1 {
                Ok(Some(true))
            } else if res == lit {
                Ok(None)
            } else {
                Err(ParserError::InvalidToken(
                    "expected 0 1 or latch literal for latch initialization, got ".to_string()
                        + tokens[2],
                ))
            }
        } else {
            Ok(Some(false))
        }?;
        check_even(lit)?;
        Ok((lit >> 1, next, init))
    }

    pub(super) fn read_output(line: &str) -> Result<u64> {
        let tokens = line.split_whitespace().collect::<Vec<&str>>();

        if tokens.is_empty() {
            return Err(ParserError::InvalidToken(
                "expected output token, got nothing".to_string(),
            )
            .into());
        }

        if tokens.len() > 1 {
            return Err(ParserError::InvalidToken(
                "expected nothing after output, got ".to_string() + tokens[1],
            )
            .into());
        }

        Ok(read_u64(tokens[0])?)
    }

    pub(super) fn read_and(line: &str) -> Result<(u64, u64, u64)> {
        let tokens = line.split_whitespace().collect::<Vec<&str>>();

        if tokens.len() < 3 {
            return Err(ParserError::InvalidToken("not enough and tokens".to_string()).into());
        }

        if tokens.len() > 3 {
            return Err(ParserError::InvalidToken(
                "expected nothing after and tokens, got ".to_string() + tokens[3],
            )
            .into());
        }

        let lhs = read_u64(tokens[0])?;
        let rhs0 = read_u64(tokens[1])?;
        let rhs1 = read_u64(tokens[2])?;

        check_even(lhs)?;
        Ok((lhs >> 1, rhs0, rhs1))
    }

    impl Aig {
        /// Creates an AIG from an open .aag file using ASCII format.
        ///
        /// Use this function if the file is already open with the reader.
        /// The symbol table names inputs, latches and outputs; unnamed ones are called
        /// `i<N>`, `l<N>` and `o<N>`. Lines of the comment section become the AIG comments.
        pub fn from_ascii(mut reader: BufReader<impl Read>) -> Result<Self> {
            let header = Header::try_from(next_line(&mut reader)?.as_str())?;
            let mut desc = Description::default();

            for _ in 0..header.i {
                desc.inputs.push(read_input(&next_line(&mut reader)?)?);
            }
            for _ in 0..header.l {
                desc.latches.push(read_latch(&next_line(&mut reader)?)?);
            }
            for _ in 0..header.o {
                desc.outputs.push(read_output(&next_line(&mut reader)?)?);
            }
            for _ in 0..header.a {
                desc.ands.push(read_and(&next_line(&mut reader)?)?);
            }

            let mut rest = String::new();
            reader
                .read_to_string(&mut rest)
                .map_err(ParserError::from)?;
            (desc.symbols, desc.comments) = read_symbols_and_comments(&rest, header)?;

            build_aig(desc)
        }
    }
}

/// Parser for the bin AIGER format.
mod bin {
    use std::io::{BufReader, Read};

    use super::{Description, Header, build_aig, next_line, read_symbols_and_comments, read_u64};
    use crate::{Aig, Result, aig::error::ParserError};

    /// Latch lines only hold the next state (and init), the latch variable is implicit.
    pub(super) fn read_latch(var: u64, line: &str) -> Result<(u64, u64, Option<bool>)> {
        let tokens = line.split_whitespace().collect::<Vec<&str>>();

        if tokens.is_empty() {
            return Err(ParserError::InvalidToken("not enough latch tokens".to_string()).into());
        }

        if tokens.len() > 2 {
            return Err(ParserError::InvalidToken(
                "expected nothing after latch, got ".to_string() + tokens[2],
            )
            .into());
        }

        let next = read_u64(tokens[0])?;
        let init = if tokens.len() > 1 {
            let res = read_u64(tokens[1])?;
            if res == 0 {
                Ok(Some(false))
            } else if res == 1 {
                Ok(Some(true))
            } else if res == (var << 1) {
                Ok(None)
            } else {
                Err(ParserError::InvalidToken(
                    "expected 0 1 or latch literal for latch initialization, got ".to_string()
                        + tokens[1],
                ))
            }
        } else {
            Ok(Some(false))
        }?;

        Ok((var, next, init))
    }

    fn too_many(count: u64) -> ParserError {
        ParserError::InvalidToken(format!("cannot hold {} inputs", count))
    }

    fn next_byte(buf: &[u8], offset: &mut usize) -> Result<u8> {
        let byte = *buf
            .get(*offset)
            .ok_or(ParserError::InvalidToken("unexpected end of file".to_string()))?;
        *offset += 1;
        Ok(byte)
    }

    pub(super) fn decode_delta(buf: &[u8], offset: &mut usize) -> Result<u64> {
        let mut x = 0;
        let mut i = 0;

        loop {
            let ch = next_byte(buf, offset)?;
            // The 10th group only has room for the last bit
            if i == 9 && ch & 0xfe != 0 {
                return Err(
                    ParserError::InvalidToken("delta does not fit in 64 bits".to_string()).into(),
                );
            }
            x |= ((ch & 0x7f) as u64) << (7 * i);
            i += 1;

            if ch & 0x80 == 0 {
                return Ok(x);
            }
        }
    }

    impl Aig {
        /// Creates an AIG from an open .aig file using bin format.
        ///
        /// Symbol table and comments are handled as in [`Aig::from_ascii`].
        pub fn from_bin(mut reader: BufReader<impl Read>) -> Result<Self> {
            let header = Header::try_from(next_line(&mut reader)?.as_str())?;
            header.check_binary()?;
            let mut desc = Description::default();

            // Inputs are implicit
            let num_inputs = usize::try_from(header.i).map_err(|_| too_many(header.i))?;
            desc.inputs
                .try_reserve_exact(num_inputs)
                .map_err(|_| too_many(header.i))?;
            desc.inputs.extend(1..=header.i);

            // Below, variables never exceed M
            for k in 0..header.l {
                let var = header.i + k + 1;
                desc.latches.push(read_latch(var, &next_line(&mut reader)?)?);
            }
            for _ in 0..header.o {
                let line = next_line(&mut reader)?;
                desc.outputs.push(read_u64(line.trim())?);
            }

            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).map_err(ParserError::from)?;

            // And gates are delta encoded, in order
            let mut offset = 0;
            for k in 0..header.a {
                let lhs = 2 * (header.i + header.l + k + 1);
                let delta0 = decode_delta(&buf, &mut offset)?;
                let delta1 = decode_delta(&buf, &mut offset)?;

                let rhs0 = lhs.checked_sub(delta0).ok_or(ParserError::InvalidToken(
                    "invalid delta for and gate ".to_string() + &lhs.to_string(),
                ))?;
                let rhs1 = rhs0.checked_sub(delta1).ok_or(ParserError::InvalidToken(
                    "invalid delta for and gate ".to_string() + &lhs.to_string(),
                ))?;
                desc.ands.push((lhs >> 1, rhs0, rhs1));
            }

            let rest = String::from_utf8(buf[offset..].to_vec()).map_err(|_| {
                ParserError::InvalidToken("symbol table is not valid utf-8".to_string())
            })?;
            (desc.symbols, desc.comments) = read_symbols_and_comments(&rest, header)?;

            build_aig(desc)
        }
    }
}

impl Aig {
    /// Creates an AIG from an .aig (resp .aag) file using bin (resp. ASCII) AIGER format.
    ///
    /// Only the `M I L O A` header is supported (no bad states, constraints, justice or fairness).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref()).map_err(ParserError::from)?;
        let reader = BufReader::new(f);
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("aag") => Aig::from_ascii(reader),
            Some("aig") => Aig::from_bin(reader),
            _ => Err(
                ParserError::IoError("invalid extension, expected .aag or .aig".to_string()).into(),
            ),
        }
    }
}
