use std::fmt;

use super::stats::CrawlStatistics;

/// Words left out of the most-common-words list
const STOPWORDS: &[&str] = &[
    "www", "div", "http", "https", "a", "about", "above", "after", "again", "against", "all",
    "am", "an", "and", "any", "are", "aren", "t", "as", "at", "be", "because", "been", "before",
    "being", "below", "between", "both", "but", "by", "can", "cannot", "could", "couldn", "did",
    "didn", "do", "does", "doesn", "doing", "don", "down", "during", "each", "few", "for",
    "from", "further", "had", "hadn", "has", "hasn", "have", "haven", "having", "he", "d", "ll",
    "s", "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "m", "ve", "if",
    "in", "into", "is", "isn", "it", "its", "itself", "let", "me", "more", "most", "mustn",
    "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other",
    "ought", "our", "ours", "ourselves", "out", "over", "own", "same", "shan", "she", "should",
    "shouldn", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "wasn", "we", "were", "weren", "what", "when",
    "where", "which", "while", "who", "whom", "why", "with", "won", "would", "wouldn", "you",
    "your", "yours", "yourself", "yourselves",
];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// End-of-crawl summary
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub unique_page_count: usize,
    /// URL and word count of the page with the most words
    pub longest_page: Option<(String, usize)>,
    /// Most frequent non-stopwords, most frequent first, ties alphabetical
    pub top_words: Vec<(String, usize)>,
    /// `ics.uci.edu` subdomains with page counts, sorted by name
    pub subdomains: Vec<(String, usize)>,
    pub failed_url_count: usize,
    pub redirect_count: usize,
}

impl Report {
    pub fn from_statistics(stats: &CrawlStatistics, top_n: usize) -> Self {
        let mut words: Vec<(String, usize)> = stats
            .word_frequency
            .iter()
            .filter(|(word, _)| !is_stopword(word))
            .map(|(word, count)| (word.clone(), *count))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(top_n);

        let mut subdomains: Vec<(String, usize)> = stats
            .subdomain_page_count
            .iter()
            .map(|(host, count)| (host.clone(), *count))
            .collect();
        subdomains.sort();

        let longest_page = (stats.max_words > 0)
            .then(|| (stats.max_words_url.clone(), stats.max_words));

        Self {
            unique_page_count: stats.unique_page_count,
            longest_page,
            top_words: words,
            subdomains,
            failed_url_count: stats.failed_url_count,
            redirect_count: stats.redirected_urls.len(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "unique page count: {}", self.unique_page_count)?;
        match &self.longest_page {
            Some((url, words)) => {
                writeln!(f, "page with max words: {}", url)?;
                writeln!(f, "page with max words #: {}", words)?;
            }
            None => writeln!(f, "page with max words: none")?,
        }
        writeln!(f, "failed urls: {}", self.failed_url_count)?;
        writeln!(f, "redirected urls: {}", self.redirect_count)?;
        writeln!(f, "top words:")?;
        for (word, count) in &self.top_words {
            writeln!(f, "{}, {}", word, count)?;
        }
        writeln!(f, "all subdomains of ics.uci.edu:")?;
        for (subdomain, count) in &self.subdomains {
            writeln!(f, "{}, {}", subdomain, count)?;
        }
        Ok(())
    }
}
