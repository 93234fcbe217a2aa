//! CoNLL-U file parsing
//!
//! Parses CoNLL-U format files into [`Sentence`]s. Multiword tokens and
//! empty nodes are kept as token lines; [`Sentence::to_tree`] leaves them
//! out of the dependency tree.
//!
//! CoNLL-U format: https://universaldependencies.org/format.html

use crate::tree::{Dep, Features, Misc, Sentence, Token, TokenId, Upos};
use atoi::FromRadix10Checked;
use bstr::ByteSlice;
use bstr::io::{BufReadExt, ByteLines};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;
use thiserror::Error;

/// Error during CoNLL-U parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at line {line_num}: {message}")]
pub struct ParseError {
    pub line_num: usize,
    pub message: String,
}

impl ParseError {
    fn new(line_num: usize, message: impl Into<String>) -> Self {
        Self {
            line_num,
            message: message.into(),
        }
    }
}

/// CoNLL-U reader that iterates over sentences
pub struct CoNLLUReader<R: BufRead> {
    lines: ByteLines<R>,
    line_num: usize,
}

impl<R: BufRead> CoNLLUReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.byte_lines(),
            line_num: 0,
        }
    }
}

impl CoNLLUReader<Box<dyn BufRead + Send>> {
    /// Create a reader from a file path
    ///
    /// Files ending in `.gz` are decompressed on the fly.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead + Send> =
            if path.extension().is_some_and(|ext| ext == "gz") {
                Box::new(BufReader::new(MultiGzDecoder::new(file)))
            } else {
                Box::new(BufReader::new(file))
            };
        Ok(Self::new(reader))
    }
}

impl CoNLLUReader<Cursor<Vec<u8>>> {
    /// Create a reader from a string
    pub fn from_string(text: &str) -> Self {
        Self::new(Cursor::new(text.as_bytes().to_vec()))
    }
}

impl<R: BufRead> Iterator for CoNLLUReader<R> {
    type Item = Result<Sentence, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut token_lines = Vec::new();
        let mut sentence = Sentence::default();
        // First bad comment; reported once the whole sentence is consumed
        let mut comment_error: Option<ParseError> = None;

        // Read lines until we hit a blank line (sentence boundary) or EOF
        loop {
            self.line_num += 1;
            match self.lines.next() {
                None => {
                    if token_lines.is_empty() && comment_error.is_none() {
                        return None;
                    }
                    // Last sentence without trailing blank line
                    break;
                }
                Some(Err(e)) => {
                    return Some(Err(ParseError::new(
                        self.line_num,
                        format!("IO error: {}", e),
                    )));
                }
                Some(Ok(line)) => {
                    let line = line.trim_end_with(|c| c == '\r');

                    if line.trim().is_empty() {
                        if !token_lines.is_empty() {
                            break;
                        }
                        continue;
                    }

                    if let Some(comment) = line.strip_prefix(b"#") {
                        if let Err(message) = parse_comment(comment, &mut sentence) {
                            comment_error
                                .get_or_insert_with(|| ParseError::new(self.line_num, message));
                        }
                        continue;
                    }

                    token_lines.push((self.line_num, line.to_vec()));
                }
            }
        }

        if let Some(err) = comment_error {
            return Some(Err(err));
        }

        for (line_num, line) in &token_lines {
            match parse_line(line) {
                Ok(token) => sentence.tokens.push(token),
                Err(message) => return Some(Err(ParseError::new(*line_num, message))),
            }
        }
        Some(Ok(sentence))
    }
}

/// Parse a comment line (after the leading `#`)
fn parse_comment(comment: &[u8], sentence: &mut Sentence) -> Result<(), String> {
    let comment = utf8(comment.trim())?;

    match comment.split_once('=') {
        Some((key, value)) => {
            let (key, value) = (key.trim(), value.trim());
            if key == "text" {
                sentence.text = Some(value.to_string());
            } else {
                sentence.metadata.insert(key.to_string(), value.to_string());
            }
        }
        None if !comment.is_empty() => {
            // Flags such as `# newdoc`
            sentence.metadata.insert(comment.to_string(), String::new());
        }
        None => {}
    }
    Ok(())
}

/// Split a token line into its ten tab-separated columns
fn split_fields(line: &[u8]) -> Result<[&[u8]; 10], String> {
    let mut fields = [&line[..0]; 10];
    let mut count = 0;
    let mut start = 0;
    for end in memchr::memchr_iter(b'\t', line).chain(std::iter::once(line.len())) {
        if count < fields.len() {
            fields[count] = &line[start..end];
        }
        count += 1;
        start = end + 1;
    }

    if count == fields.len() {
        Ok(fields)
    } else {
        Err(format!("Expected 10 fields, found {}", count))
    }
}

/// Parse a single CoNLL-U token line
fn parse_line(line: &[u8]) -> Result<Token, String> {
    let fields = split_fields(line)?;

    let id = parse_id(fields[0])?;
    let form = utf8(fields[1])?.to_string();
    let lemma = optional(fields[2])?;
    let upos = match optional(fields[3])? {
        Some(tag) => Some(tag.parse::<Upos>().map_err(|e| e.to_string())?),
        None => None,
    };
    let xpos = optional(fields[4])?;
    let feats = parse_features(fields[5])?;
    let head = parse_head(fields[6])?;
    let deprel = optional(fields[7])?;
    let deps = parse_deps(fields[8])?;
    let misc: Misc = parse_features(fields[9])?;

    Ok(Token {
        id,
        form,
        lemma,
        upos,
        xpos,
        feats,
        head,
        deprel,
        deps,
        misc,
    })
}

fn utf8(bytes: &[u8]) -> Result<&str, String> {
    bytes
        .to_str()
        .map_err(|e| format!("Invalid UTF-8: {}", e))
}

/// `_` marks an unspecified column
fn optional(field: &[u8]) -> Result<Option<String>, String> {
    if field == b"_" {
        Ok(None)
    } else {
        Ok(Some(utf8(field)?.to_string()))
    }
}

/// Parse a whole field as an unsigned integer
fn parse_usize(bytes: &[u8]) -> Option<usize> {
    match usize::from_radix_10_checked(bytes) {
        (Some(n), used) if used > 0 && used == bytes.len() => Some(n),
        _ => None,
    }
}

fn parse_number(bytes: &[u8], what: &str) -> Result<usize, String> {
    parse_usize(bytes).ok_or_else(|| format!("Invalid {}: {}", what, bytes.as_bstr()))
}

/// Parse ID field (can be integer, range, or decimal)
fn parse_id(s: &[u8]) -> Result<TokenId, String> {
    if let Some(dash) = memchr::memchr(b'-', s) {
        let start = parse_number(&s[..dash], "range start")?;
        let end = parse_number(&s[dash + 1..], "range end")?;
        Ok(TokenId::Range(start, end))
    } else if let Some(dot) = memchr::memchr(b'.', s) {
        let main = parse_number(&s[..dot], "decimal main")?;
        let sub = parse_number(&s[dot + 1..], "decimal sub")?;
        Ok(TokenId::Decimal(main, sub))
    } else {
        Ok(TokenId::Single(parse_number(s, "ID")?))
    }
}

/// Parse HEAD field; `Some(0)` is the root, `_` is no head
fn parse_head(s: &[u8]) -> Result<Option<usize>, String> {
    if s == b"_" {
        Ok(None)
    } else {
        parse_number(s, "HEAD").map(Some)
    }
}

/// Parse FEATS or MISC field (key=value|key=value)
fn parse_features(s: &[u8]) -> Result<Features, String> {
    let mut feats = Features::new();

    if s == b"_" {
        return Ok(feats);
    }

    for pair in utf8(s)?.split('|') {
        if let Some((key, value)) = pair.split_once('=') {
            feats.insert(key.to_string(), value.to_string());
        }
    }

    Ok(feats)
}

/// Parse DEPS field (head:deprel|head:deprel)
fn parse_deps(s: &[u8]) -> Result<Vec<Dep>, String> {
    let mut deps = Vec::new();

    if s == b"_" {
        return Ok(deps);
    }

    for pair in utf8(s)?.split('|') {
        if let Some((head, deprel)) = pair.split_once(':') {
            // Empty-node heads such as 8.1 are not representable here
            if let Some(head) = parse_usize(head.as_bytes()) {
                deps.push(Dep {
                    head,
                    deprel: deprel.to_string(),
                });
            }
        }
    }

    Ok(deps)
}

/// Parse every sentence in a string, stopping at the first error
pub fn parse_sentences(text: &str) -> Result<Vec<Sentence>, ParseError> {
    CoNLLUReader::from_string(text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SIMPLE: &str = "# sent_id = s1\n\
# text = The dog runs.\n\
1\tThe\tthe\tDET\tDT\t_\t2\tdet\t_\t_\n\
2\tdog\tdog\tNOUN\tNN\tNumber=Sing\t3\tnsubj\t_\t_\n\
3\truns\trun\tVERB\tVBZ\t_\t0\troot\t_\tSpaceAfter=No\n\
4\t.\t.\tPUNCT\t.\t_\t3\tpunct\t_\t_\n\
\n";

    #[test]
    fn test_parse_simple_sentence() {
        let mut reader = CoNLLUReader::from_string(SIMPLE);
        let sentence = reader.next().unwrap().unwrap();

        assert_eq!(sentence.len(), 4);
        assert_eq!(sentence.text.as_deref(), Some("The dog runs."));
        assert_eq!(sentence.sent_id(), Some("s1"));

        let dog = &sentence.tokens[1];
        assert_eq!(dog.id, TokenId::Single(2));
        assert_eq!(dog.form, "dog");
        assert_eq!(dog.lemma.as_deref(), Some("dog"));
        assert_eq!(dog.upos, Some(Upos::Noun));
        assert_eq!(dog.xpos.as_deref(), Some("NN"));
        assert_eq!(dog.feats.get("Number"), Some("Sing"));
        assert_eq!(dog.head, Some(3));
        assert_eq!(dog.deprel.as_deref(), Some("nsubj"));

        assert_eq!(sentence.tokens[2].head, Some(0));
        assert_eq!(sentence.tokens[2].misc.get("SpaceAfter"), Some("No"));

        assert!(reader.next().is_none());
    }

    #[test]
    fn test_multiword_and_empty_nodes() {
        let conllu = "1-2\tdon't\t_\t_\t_\t_\t_\t_\t_\t_\n\
1\tdo\tdo\tAUX\tVBP\t_\t3\taux\t_\t_\n\
2\tn't\tnot\tPART\tRB\t_\t3\tadvmod\t_\t_\n\
3\tgo\tgo\tVERB\tVB\t_\t0\troot\t3:root\t_\n\
3.1\tgo\tgo\tVERB\tVB\t_\t_\t_\t3:conj\t_\n";

        let sentences = parse_sentences(conllu).unwrap();
        assert_eq!(sentences.len(), 1);

        let tokens = &sentences[0].tokens;
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].id, TokenId::Range(1, 2));
        assert_eq!(tokens[0].upos, None);
        assert_eq!(tokens[0].deprel, None);
        assert_eq!(tokens[4].id, TokenId::Decimal(3, 1));
        assert_eq!(tokens[4].head, None);
        assert_eq!(
            tokens[4].deps,
            vec![Dep {
                head: 3,
                deprel: "conj".to_string()
            }]
        );
    }

    #[test]
    fn test_sentence_boundaries() {
        let conllu = "\n\n1\tHi\thi\tINTJ\tUH\t_\t0\troot\t_\t_\n\n\n\
# text = Bye\n\
1\tBye\tbye\tINTJ\tUH\t_\t0\troot\t_\t_";

        let sentences = parse_sentences(conllu).unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, None);
        assert_eq!(sentences[1].text.as_deref(), Some("Bye"));
    }

    #[test]
    fn test_crlf_and_flag_comments() {
        let conllu = "# newdoc\r\n# text = Hi\r\n1\tHi\thi\tINTJ\tUH\t_\t0\troot\t_\t_\r\n\r\n";
        let sentences = parse_sentences(conllu).unwrap();

        assert_eq!(sentences[0].metadata.get("newdoc").map(String::as_str), Some(""));
        assert_eq!(sentences[0].text.as_deref(), Some("Hi"));
        assert_eq!(sentences[0].tokens[0].misc.len(), 0);
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let conllu = "1\tdog\tdog\tNOUN\tNN\t_\t0\troot\t_\t_\n\
2\tbad\tline\n\
\n\
1\tok\tok\tINTJ\tUH\t_\t0\troot\t_\t_\n";

        let mut reader = CoNLLUReader::from_string(conllu);
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(err.line_num, 2);
        assert_eq!(err.message, "Expected 10 fields, found 3");

        // The reader recovers at the next sentence
        let next = reader.next().unwrap().unwrap();
        assert_eq!(next.tokens[0].form, "ok");
    }

    #[test]
    fn test_bad_comment_consumes_its_sentence() {
        let mut conllu = b"# text = ok\n# bad = ".to_vec();
        conllu.extend_from_slice(b"\xff\xfe\n");
        conllu.extend_from_slice(b"1\tok\tok\tINTJ\tUH\t_\t0\troot\t_\t_\n\n");
        conllu.extend_from_slice(b"# text = next\n1\tnext\tnext\tADJ\tJJ\t_\t0\troot\t_\t_\n");

        let items: Vec<_> = CoNLLUReader::new(Cursor::new(conllu)).collect();
        assert_eq!(items.len(), 2);

        let err = items[0].as_ref().unwrap_err();
        assert_eq!(err.line_num, 2);
        assert!(err.message.starts_with("Invalid UTF-8"));

        let next = items[1].as_ref().unwrap();
        assert_eq!(next.text.as_deref(), Some("next"));
        assert_eq!(next.tokens[0].form, "next");
    }

    #[test]
    fn test_bad_comment_at_end_of_input() {
        let items: Vec<_> = CoNLLUReader::new(Cursor::new(b"# bad = \xff\n".to_vec())).collect();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[test]
    fn test_unknown_upos() {
        let err = parse_sentences("1\tdog\tdog\tNOUNY\tNN\t_\t0\troot\t_\t_\n").unwrap_err();
        assert_eq!(err.message, "unknown UPOS tag: NOUNY");
        assert_eq!(err.to_string(), "Parse error at line 1: unknown UPOS tag: NOUNY");
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(b"42").unwrap(), TokenId::Single(42));
        assert_eq!(parse_id(b"5-7").unwrap(), TokenId::Range(5, 7));
        assert_eq!(parse_id(b"10.5").unwrap(), TokenId::Decimal(10, 5));
        assert!(parse_id(b"4x").is_err());
        assert!(parse_id(b"").is_err());
    }

    #[test]
    fn test_parse_head() {
        assert_eq!(parse_head(b"0").unwrap(), Some(0));
        assert_eq!(parse_head(b"5").unwrap(), Some(5));
        assert_eq!(parse_head(b"_").unwrap(), None);
        assert!(parse_head(b"-1").is_err());
    }

    #[test]
    fn test_parse_features() {
        let feats = parse_features(b"Case=Nom|Number=Sing").unwrap();
        assert_eq!(feats.get("Case"), Some("Nom"));
        assert_eq!(feats.get("Number"), Some("Sing"));
        assert!(parse_features(b"_").unwrap().is_empty());
    }

    #[test]
    fn test_from_gzip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simple.conllu.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(SIMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let sentences: Vec<_> = CoNLLUReader::from_file(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].tokens[2].form, "runs");
    }
}
