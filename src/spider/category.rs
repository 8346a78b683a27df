//! Category listing parser

use crate::spider::{MovieSpider, Page, ParseOutput, Task};
use crate::url::resolve_link;

impl MovieSpider {
    /// Parses one page of a category listing
    ///
    /// Emits a movie task for every article link in the grouped listing and,
    /// when a link labelled with the next-page text exists, a category task for
    /// page `page_number + 1`. No next-page link ends the pagination.
    pub fn parse_category(&self, page: &Page, page_number: u32) -> ParseOutput {
        let document = page.document();
        let mut output = ParseOutput::new();

        for link in document.select(&self.selectors.category_link) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };

            match resolve_link(href, &page.url) {
                Some(target) => output.add_request(Task::movie(target)),
                None => tracing::debug!("Skipping movie link '{}' on {}", href, page.url),
            }
        }

        let movies = output.requests.len();

        let next_page = document
            .select(&self.selectors.link)
            .filter(|link| {
                link.text()
                    .collect::<String>()
                    .contains(&self.config.next_page_label)
            })
            .find_map(|link| link.value().attr("href"))
            .and_then(|href| resolve_link(href, &page.url));

        match next_page {
            Some(target) => {
                tracing::debug!(
                    "Category page {} lists {} movies, next page {}",
                    page_number,
                    movies,
                    target
                );
                output.add_request(Task::category(target, page_number + 1));
            }
            None => {
                tracing::info!(
                    "Category page {} lists {} movies and is the last page",
                    page_number,
                    movies
                );
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpiderConfig;
    use crate::spider::Continuation;
    use url::Url;

    fn spider() -> MovieSpider {
        MovieSpider::new(SpiderConfig::default()).unwrap()
    }

    fn page(body: &str) -> Page {
        Page::new(
            Url::parse("https://ru.wikipedia.org/wiki/Категория:Фильмы_по_алфавиту").unwrap(),
            body,
        )
    }

    const THREE_MOVIES: &str = r#"
        <div class="mw-category">
          <div class="mw-category-group"><h3>А</h3>
            <ul>
              <li><a href="/wiki/Андрей_Рублёв_(фильм)">Андрей Рублёв</a></li>
              <li><a href="/wiki/Асса">Асса</a></li>
            </ul>
          </div>
          <div class="mw-category-group"><h3>Б</h3>
            <ul><li><a href="/wiki/Брат_(фильм)">Брат</a></li></ul>
          </div>
        </div>
    "#;

    #[test]
    fn test_last_page_schedules_only_movies() {
        let output = spider().parse_category(&page(THREE_MOVIES), 1);

        assert!(output.items.is_empty());
        assert_eq!(output.requests.len(), 3);
        assert!(output
            .requests
            .iter()
            .all(|task| task.continuation == Continuation::Movie));
        assert_eq!(
            output.requests[2].target.as_str(),
            "https://ru.wikipedia.org/wiki/%D0%91%D1%80%D0%B0%D1%82_(%D1%84%D0%B8%D0%BB%D1%8C%D0%BC)"
        );
    }

    #[test]
    fn test_next_page_link_is_resolved() {
        let body = format!(
            r#"{}<div id="mw-pages">
                 <a href="/w/index.php?title=Категория:Фильмы_по_алфавиту&amp;pagefrom=Брат">Следующая страница</a>
               </div>"#,
            THREE_MOVIES
        );
        let current = page(&body);

        let output = spider().parse_category(&current, 4);

        assert_eq!(output.requests.len(), 4);
        let next = output.requests.last().unwrap();
        assert_eq!(next.continuation, Continuation::Category { page_number: 5 });
        assert_eq!(
            next.target,
            current
                .url
                .join("/w/index.php?title=Категория:Фильмы_по_алфавиту&pagefrom=Брат")
                .unwrap()
        );
    }

    #[test]
    fn test_previous_page_link_is_not_followed() {
        let body = r#"
            <div id="mw-pages">
              <a href="/w/index.php?pageuntil=А">Предыдущая страница</a>
            </div>
        "#;
        let output = spider().parse_category(&page(body), 2);
        assert!(output.is_empty());
    }

    #[test]
    fn test_links_outside_groups_ignored() {
        let body = r#"
            <div id="content"><a href="/wiki/Заглавная_страница">Заглавная</a></div>
            <div class="mw-category-group"><ul><li><a href="/wiki/Сталкер_(фильм)">Сталкер</a></li></ul></div>
        "#;
        let output = spider().parse_category(&page(body), 1);
        assert_eq!(output.requests.len(), 1);
        assert_eq!(output.requests[0].continuation, Continuation::Movie);
    }

    #[test]
    fn test_unusable_hrefs_skipped() {
        let body = r##"
            <div class="mw-category-group"><ul>
              <li><a href="javascript:void(0)">?</a></li>
              <li><a href="#top">↑</a></li>
              <li><a href="https://ru.wikipedia.org/wiki/Кин-дза-дза!">Кин-дза-дза!</a></li>
            </ul></div>
        "##;
        let output = spider().parse_category(&page(body), 1);
        assert_eq!(output.requests.len(), 1);
    }

    #[test]
    fn test_custom_next_page_label() {
        let config = SpiderConfig {
            next_page_label: "next page".to_string(),
            ..SpiderConfig::default()
        };
        let body = r#"<a href="/w/index.php?pagefrom=B">next page</a>"#;
        let output = MovieSpider::new(config)
            .unwrap()
            .parse_category(&page(body), 1);
        assert_eq!(output.requests.len(), 1);
        assert_eq!(
            output.requests[0].continuation,
            Continuation::Category { page_number: 2 }
        );
    }
}
