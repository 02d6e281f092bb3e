//! Folds the decoded lines of one record into a [`BlockSet`] plus metadata and
//! enforces the record-level consistency rules.

use crate::Address;
use crate::block::Block;
use crate::blockset::BlockSet;
use crate::error::SRecordErrorKind;
use crate::line::{AddressWidth, Line, LineType};
use tracing::{trace, warn};

/// What the caller should do with the line it just fed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Feed {
    Consumed,
    /// The line starts a new record; push it back and finish this one.
    EndOfRecord,
}

#[derive(Debug, Default)]
pub(crate) struct Assembled {
    pub(crate) blocks: BlockSet,
    pub(crate) header: Option<Vec<u8>>,
    pub(crate) width: AddressWidth,
    pub(crate) termination_address: Option<Address>,
}

#[derive(Debug, Default)]
pub(crate) struct RecordAssembler {
    strict: bool,
    lines: usize,
    out: Assembled,
    data_type: Option<LineType>,
    data_lines: u64,
    line_count: Option<u64>,
    termination: Option<LineType>,
}

impl RecordAssembler {
    pub(crate) fn new(strict: bool) -> Self {
        Self {
            strict,
            ..Self::default()
        }
    }

    /// True until the first line has been consumed.
    pub(crate) const fn is_empty(&self) -> bool {
        self.lines == 0
    }

    pub(crate) fn push(&mut self, line: Line) -> Result<Feed, SRecordErrorKind> {
        if line.ltype != LineType::Header && self.lines == 0 && self.strict {
            return Err(SRecordErrorKind::MissingHeader);
        }

        match line.ltype {
            LineType::Header => {
                if self.lines > 0 {
                    return Ok(Feed::EndOfRecord);
                }
                self.out.header = Some(line.data);
            }
            LineType::Data16 | LineType::Data24 | LineType::Data32 => self.push_data(line)?,
            LineType::Count16 | LineType::Count24 => {
                if self.line_count.is_some() {
                    if self.strict {
                        return Err(SRecordErrorKind::DuplicateLineCount);
                    }
                    warn!(count = line.address, "ignoring duplicate S5/S6 line");
                } else {
                    self.line_count = Some(line.address);
                }
            }
            LineType::Start32 | LineType::Start24 | LineType::Start16 => {
                if self.termination.is_some() {
                    if self.strict {
                        return Err(SRecordErrorKind::DuplicateStartAddress);
                    }
                    warn!(address = line.address, "ignoring duplicate S7/S8/S9 line");
                } else {
                    self.termination = Some(line.ltype);
                    self.out.termination_address = Some(line.address);
                    self.check_termination_type()?;
                }
            }
        }
        self.lines += 1;
        Ok(Feed::Consumed)
    }

    fn push_data(&mut self, line: Line) -> Result<(), SRecordErrorKind> {
        match self.data_type {
            None => {
                self.data_type = Some(line.ltype);
                self.check_termination_type()?;
            }
            Some(first) if first != line.ltype => {
                if self.strict {
                    return Err(SRecordErrorKind::MixedDataLineTypes);
                }
                warn!(
                    first = first as u8,
                    found = line.ltype as u8,
                    "mixed data line types in one record"
                );
            }
            Some(_) => {}
        }
        self.data_lines += 1;

        let block = Block::from_bytes(line.address, line.data);
        if block.is_empty() {
            return Ok(());
        }
        if self.strict || (!self.out.blocks.is_empty() && self.out.blocks.end() == block.start()) {
            self.out.blocks.append_or_insert(block);
        } else {
            self.out.blocks.set_range(block);
        }
        Ok(())
    }

    fn check_termination_type(&self) -> Result<(), SRecordErrorKind> {
        if let (Some(data), Some(term)) = (self.data_type, self.termination)
            && AddressWidth::from_data_type(data).termination_type() != Some(term)
        {
            if self.strict {
                return Err(SRecordErrorKind::StartAddressTypeMismatch);
            }
            warn!(
                data = data as u8,
                termination = term as u8,
                "termination line type does not match data line type"
            );
        }
        Ok(())
    }

    /// Applies the checks that need the whole record and hands out the result.
    ///
    /// In strict mode blocks are left as inserted, so overlaps can still be reported
    /// by validation.
    pub(crate) fn finish(self) -> Result<Assembled, SRecordErrorKind> {
        if self.data_lines == 0 {
            return Err(SRecordErrorKind::MissingDataLines);
        }
        if let Some(declared) = self.line_count
            && declared != self.data_lines
        {
            if self.strict {
                return Err(SRecordErrorKind::LineCountMismatch(declared, self.data_lines));
            }
            warn!(declared, found = self.data_lines, "S5/S6 line count mismatch");
        }
        if self.strict && self.termination.is_none() {
            return Err(SRecordErrorKind::MissingStartAddress);
        }

        let mut out = self.out;
        out.width = self
            .data_type
            .map_or(AddressWidth::Undefined, AddressWidth::from_data_type);
        trace!(
            lines = self.lines,
            data_lines = self.data_lines,
            blocks = out.blocks.len(),
            "record assembled"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> Line {
        Line::parse(text.as_bytes()).unwrap()
    }

    fn data16(address: Address, data: &[u8]) -> Line {
        line(&Line::create(LineType::Data16, address, data))
    }

    fn feed(asm: &mut RecordAssembler, lines: Vec<Line>) -> Result<(), SRecordErrorKind> {
        for l in lines {
            asm.push(l)?;
        }
        Ok(())
    }

    #[test]
    fn test_complete_record() {
        // Arrange
        let mut asm = RecordAssembler::new(true);

        // Act
        let res = feed(
            &mut asm,
            vec![
                line("S00F000068656C6C6F212020202000003B"),
                data16(0x00, &[1, 2, 3, 4]),
                data16(0x04, &[5, 6]),
                data16(0x10, &[7]),
                line("S5030003F9"),
                line("S9030000FC"),
            ],
        );
        let out = asm.finish();

        // Assert
        assert!(res.is_ok());
        let out = out.unwrap();
        assert_eq!(out.width, AddressWidth::Width16);
        assert_eq!(out.header.as_deref(), Some(&b"hello!    \0\0"[..]));
        assert_eq!(out.termination_address, Some(0));
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(out.blocks.blocks()[0].bytes(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_second_header_ends_record() {
        // Arrange
        let mut asm = RecordAssembler::new(false);
        asm.push(line("S00F000068656C6C6F212020202000003B")).unwrap();
        asm.push(data16(0x00, &[1])).unwrap();

        // Act
        let feed = asm.push(line("S00F000068656C6C6F212020202000003B"));

        // Assert
        assert_eq!(feed, Ok(Feed::EndOfRecord));
        assert!(asm.finish().is_ok());
    }

    #[test]
    fn test_strict_errors() {
        // Each tuple = (lines, expected error); every record starts with a header
        let header = || line("S00F000068656C6C6F212020202000003B");
        let cases: Vec<(Vec<Line>, SRecordErrorKind)> = vec![
            (vec![data16(0, &[1])], SRecordErrorKind::MissingHeader),
            (
                vec![header(), data16(0, &[1]), line("S5030001FB"), line("S5030001FB")],
                SRecordErrorKind::DuplicateLineCount,
            ),
            (
                vec![header(), data16(0, &[1]), line("S9030000FC"), line("S9030000FC")],
                SRecordErrorKind::DuplicateStartAddress,
            ),
            (
                vec![header(), data16(0, &[1]), line("S804000000FB")],
                SRecordErrorKind::StartAddressTypeMismatch,
            ),
            (
                vec![header(), line("S804000000FB"), data16(0, &[1])],
                SRecordErrorKind::StartAddressTypeMismatch,
            ),
            (
                vec![header(), line("S2080010007C0802A6BB"), data16(0, &[1])],
                SRecordErrorKind::MixedDataLineTypes,
            ),
        ];

        for (lines, expected) in cases {
            let mut asm = RecordAssembler::new(true);
            assert_eq!(feed(&mut asm, lines), Err(expected));
        }
    }

    #[test]
    fn test_strict_finish_errors() {
        // Arrange
        let header = || line("S00F000068656C6C6F212020202000003B");
        let cases: Vec<(Vec<Line>, SRecordErrorKind)> = vec![
            (vec![header(), line("S9030000FC")], SRecordErrorKind::MissingDataLines),
            (
                vec![header(), data16(0, &[1]), line("S5030007F5"), line("S9030000FC")],
                SRecordErrorKind::LineCountMismatch(7, 1),
            ),
            (vec![header(), data16(0, &[1])], SRecordErrorKind::MissingStartAddress),
        ];

        for (lines, expected) in cases {
            // Act
            let mut asm = RecordAssembler::new(true);
            feed(&mut asm, lines).unwrap();

            // Assert
            assert_eq!(asm.finish().err(), Some(expected));
        }
    }

    #[test]
    fn test_lenient_tolerates_structure() {
        // Arrange
        let mut asm = RecordAssembler::new(false);

        // Act
        let res = feed(
            &mut asm,
            vec![
                data16(0x00, &[1, 1, 1, 1]),
                line("S2080010007C0802A6BB"),
                data16(0x02, &[2, 2]),
                line("S5030007F5"),
                line("S5030001FB"),
                line("S804000000FB"),
            ],
        );
        let out = asm.finish();

        // Assert
        assert!(res.is_ok());
        let out = out.unwrap();
        assert_eq!(out.header, None);
        assert_eq!(out.width, AddressWidth::Width16);
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(out.blocks.blocks()[0].bytes(), &[1, 1, 2, 2]);
        assert_eq!(out.blocks.blocks()[1].start(), 0x1000);
    }

    #[test]
    fn test_lenient_missing_data_is_still_an_error() {
        // Arrange
        let mut asm = RecordAssembler::new(false);
        asm.push(line("S9030000FC")).unwrap();

        // Act & Assert
        assert_eq!(asm.finish().err(), Some(SRecordErrorKind::MissingDataLines));
    }

    #[test]
    fn test_strict_keeps_overlap_for_validation() {
        // Arrange
        let mut asm = RecordAssembler::new(true);
        feed(
            &mut asm,
            vec![
                line("S00F000068656C6C6F212020202000003B"),
                data16(0x38, &[0; 14]),
                data16(0x3A, &[0; 14]),
                line("S9030000FC"),
            ],
        )
        .unwrap();

        // Act
        let out = asm.finish().unwrap();

        // Assert
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(out.blocks.blocks()[0].start(), 0x38);
        assert_eq!(out.blocks.blocks()[1].start(), 0x3A);
    }
}
