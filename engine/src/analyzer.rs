use lazy_static::lazy_static;
use std::collections::HashSet;

use crate::config::VectorizerConfig;

lazy_static! {
    // scikit-learn's ENGLISH_STOP_WORDS, which the served models are trained with.
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","across","after","afterwards","again","against","all","almost","alone","along","already","also","although","always","am","among","amongst","amoungst","amount","an","and","another","any","anyhow","anyone","anything","anyway","anywhere","are","around","as","at",
            "back","be","became","because","become","becomes","becoming","been","before","beforehand","behind","being","below","beside","besides","between","beyond","bill","both","bottom","but","by",
            "call","can","cannot","cant","co","con","could","couldnt","cry",
            "de","describe","detail","do","done","down","due","during",
            "each","eg","eight","either","eleven","else","elsewhere","empty","enough","etc","even","ever","every","everyone","everything","everywhere","except",
            "few","fifteen","fifty","fill","find","fire","first","five","for","former","formerly","forty","found","four","from","front","full","further",
            "get","give","go",
            "had","has","hasnt","have","he","hence","her","here","hereafter","hereby","herein","hereupon","hers","herself","him","himself","his","how","however","hundred",
            "i","ie","if","in","inc","indeed","interest","into","is","it","its","itself",
            "keep",
            "last","latter","latterly","least","less","ltd",
            "made","many","may","me","meanwhile","might","mill","mine","more","moreover","most","mostly","move","much","must","my","myself",
            "name","namely","neither","never","nevertheless","next","nine","no","nobody","none","noone","nor","not","nothing","now","nowhere",
            "of","off","often","on","once","one","only","onto","or","other","others","otherwise","our","ours","ourselves","out","over","own",
            "part","per","perhaps","please","put",
            "rather","re",
            "same","see","seem","seemed","seeming","seems","serious","several","she","should","show","side","since","sincere","six","sixty","so","some","somehow","someone","something","sometime","sometimes","somewhere","still","such","system",
            "take","ten","than","that","the","their","them","themselves","then","thence","there","thereafter","thereby","therefore","therein","thereupon","these","they","thick","thin","third","this","those","though","three","through","throughout","thru","thus","to","together","too","top","toward","towards","twelve","twenty","two",
            "un","under","until","up","upon","us",
            "very","via",
            "was","we","well","were","what","whatever","when","whence","whenever","where","whereafter","whereas","whereby","wherein","whereupon","wherever","whether","which","while","whither","who","whoever","whole","whom","whose","why","will","with","within","without","would",
            "yet","you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Splits normalized text into vocabulary candidate terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Analyzer {
    min_n: usize,
    max_n: usize,
    stop_words: bool,
}

impl Analyzer {
    pub fn new(config: &VectorizerConfig) -> Self {
        let (min_n, max_n) = config.ngram_range;
        Self { min_n: min_n.max(1), max_n: max_n.max(1), stop_words: config.stop_words }
    }

    /// Words of two or more characters, stop words removed, expanded into
    /// every n-gram in the configured range. N-grams are formed after stop
    /// word removal, so "cats and dogs" yields the bigram "cats dogs".
    pub fn analyze(&self, normalized: &str) -> Vec<String> {
        let tokens: Vec<&str> = normalized
            .split_whitespace()
            .filter(|t| t.chars().count() >= 2)
            .filter(|t| !(self.stop_words && is_stopword(t)))
            .collect();

        let mut terms = Vec::new();
        for n in self.min_n..=self.max_n {
            if n == 1 {
                terms.extend(tokens.iter().map(|t| t.to_string()));
                continue;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer(range: (usize, usize), stop_words: bool) -> Analyzer {
        Analyzer::new(&VectorizerConfig { ngram_range: range, stop_words, ..Default::default() })
    }

    #[test]
    fn drops_single_chars_and_stopwords() {
        let terms = analyzer((1, 1), true).analyze("i read a book about the rust language");
        assert_eq!(terms, vec!["read", "book", "rust", "language"]);
    }

    #[test]
    fn uses_full_english_stop_list() {
        assert_eq!(STOPWORDS.len(), 318);
        let terms = analyzer((1, 1), true).analyze("go get first system show top find back call take two three");
        assert!(terms.is_empty(), "{terms:?}");
        // common words that are not on the list
        let terms = analyzer((1, 1), true).analyze("did just having does");
        assert_eq!(terms, vec!["did", "just", "having", "does"]);
    }

    #[test]
    fn keeps_stopwords_when_disabled() {
        let terms = analyzer((1, 1), false).analyze("cats and dogs");
        assert_eq!(terms, vec!["cats", "and", "dogs"]);
    }

    #[test]
    fn builds_ngrams_after_stopword_removal() {
        let terms = analyzer((1, 3), true).analyze("cats and dogs play");
        assert_eq!(
            terms,
            vec!["cats", "dogs", "play", "cats dogs", "dogs play", "cats dogs play"]
        );
    }

    #[test]
    fn bigrams_only() {
        let terms = analyzer((2, 2), true).analyze("deep learning datasets");
        assert_eq!(terms, vec!["deep learning", "learning datasets"]);
        assert!(analyzer((2, 2), true).analyze("single").is_empty());
    }
}
