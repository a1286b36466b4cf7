//! ANSI codepage to GDI charset translation

/// GDI `DEFAULT_CHARSET` style constant used when a codepage has no entry
pub const ANSI_CHARSET: u32 = 0;

/// Codepage → charset pairs understood by the font mapper
const CHARSET_TABLE: &[(u32, u32)] = &[
    (932, 128),  // SHIFTJIS_CHARSET
    (936, 134),  // GB2312_CHARSET
    (949, 129),  // HANGUL_CHARSET
    (950, 136),  // CHINESEBIG5_CHARSET
    (1250, 238), // EASTEUROPE_CHARSET
    (1251, 204), // RUSSIAN_CHARSET
    (1252, 0),   // ANSI_CHARSET
    (1253, 161), // GREEK_CHARSET
    (1254, 162), // TURKISH_CHARSET
    (1255, 177), // HEBREW_CHARSET
    (1256, 178), // ARABIC_CHARSET
    (1257, 186), // BALTIC_CHARSET
];

/// Legacy charset for an ANSI codepage; unknown codepages map to 0
pub fn charset_for(ansi_code_page: u32) -> u32 {
    CHARSET_TABLE
        .iter()
        .find(|(code_page, _)| *code_page == ansi_code_page)
        .map(|(_, charset)| *charset)
        .unwrap_or(ANSI_CHARSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_entry() {
        let expected = [
            (932, 128),
            (936, 134),
            (949, 129),
            (950, 136),
            (1250, 238),
            (1251, 204),
            (1252, 0),
            (1253, 161),
            (1254, 162),
            (1255, 177),
            (1256, 178),
            (1257, 186),
        ];
        for (code_page, charset) in expected {
            assert_eq!(charset_for(code_page), charset, "codepage {code_page}");
        }
    }

    #[test]
    fn test_unknown_codepages_map_to_zero() {
        for code_page in [0, 437, 850, 874, 1258, 65001, u32::MAX] {
            assert_eq!(charset_for(code_page), 0, "codepage {code_page}");
        }
    }
}
