use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","across","after","afterwards","again","against","all","almost","alone","along","already","also","although","always","am","among","amongst","an","and","another","any","anyhow","anyone","anything","anyway","anywhere","are","around","as","at",
            "be","became","because","become","becomes","been","before","beforehand","behind","being","below","beside","besides","between","beyond","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","done","down","due","during",
            "each","either","else","elsewhere","enough","etc","even","ever","every","everyone","everything","everywhere","except",
            "few","for","former","formerly","from","further",
            "had","has","have","having","he","hence","her","here","hereafter","hereby","herein","hers","herself","him","himself","his","how","however",
            "i","ie","if","in","indeed","into","is","it","its","itself",
            "just","latter","latterly","least","less","ltd",
            "made","many","may","me","meanwhile","might","more","moreover","most","mostly","much","must","my","myself",
            "namely","neither","never","nevertheless","next","no","nobody","none","noone","nor","not","nothing","now","nowhere",
            "of","off","often","on","once","one","only","onto","or","other","others","otherwise","our","ours","ourselves","out","over","own",
            "per","perhaps","please","rather","re",
            "same","seem","seemed","seeming","seems","several","she","should","since","so","some","somehow","someone","something","sometime","sometimes","somewhere","still","such",
            "than","that","the","their","theirs","them","themselves","then","thence","there","thereafter","thereby","therefore","therein","these","they","this","those","though","through","throughout","thru","thus","to","together","too","toward","towards",
            "under","until","up","upon","us",
            "very","via",
            "was","we","well","were","what","whatever","when","whence","whenever","where","whereafter","whereas","whereby","wherein","whereupon","wherever","whether","which","while","who","whoever","whole","whom","whose","why","will","with","within","without","would",
            "yet","you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    pub remove_stopwords: bool,
    /// English Snowball stemming. Off by default so names and genres stay intact.
    pub stem: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self { remove_stopwords: true, stem: false }
    }
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize text using NFKC normalization, lowercasing, splitting on non-alphanumeric
/// boundaries, stopword removal and optional stemming.
pub fn tokenize(text: &str, options: &TokenizerOptions) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for mat in RE.find_iter(&normalized) {
        let token = mat.as_str();
        if options.remove_stopwords && is_stopword(token) { continue; }
        if options.stem {
            tokens.push(STEMMER.stem(token).to_string());
        } else {
            tokens.push(token.to_string());
        }
    }
    tokens
}
