//! Shared maud templates, styles and formatting helpers.

use std::sync::OnceLock;

use maud::{DOCTYPE, Markup, PreEscaped, html};
use numfmt::{Formatter, Precision};

/// A link with blue text for use in a paragraph.
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 font-semibold";

pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-blue-500
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600
    hover:enabled:dark:bg-blue-700 text-white rounded";

pub const BUTTON_DELETE_STYLE: &str = "text-red-600 hover:text-red-500 \
    dark:text-red-500 dark:hover:text-red-400 font-semibold";

pub const FORM_CONTAINER_STYLE: &str = "flex flex-col items-center px-6 py-8 \
    mx-auto w-full max-w-md lg:py-5";

pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";

pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    bg-gray-50 border border-gray-300 text-gray-900 \
    focus:ring-blue-600 focus:border-blue-600 \
    dark:bg-gray-700 dark:border-gray-600 dark:placeholder-gray-400 dark:text-white";

pub const FORM_RADIO_GROUP_STYLE: &str = "flex gap-2";

pub const FORM_RADIO_INPUT_STYLE: &str = "peer sr-only";

pub const FORM_RADIO_LABEL_STYLE: &str = "flex-1 rounded border border-gray-300 \
    px-4 py-2 text-center text-sm cursor-pointer \
    peer-checked:border-blue-600 peer-checked:bg-blue-50 peer-checked:text-blue-700 \
    dark:border-gray-600 dark:peer-checked:bg-blue-900/30 dark:peer-checked:text-blue-200";

pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

pub const CATEGORY_BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 \
    text-xs font-semibold text-blue-800 bg-blue-100 rounded-full \
    dark:bg-blue-900 dark:text-blue-300";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

pub const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";

pub enum HeadElement {
    /// The file path or URL to a JavaScript script.
    ScriptLink(String),
    #[allow(dead_code)]
    /// JavaScript source code.
    ScriptSource(PreEscaped<String>),
    Style(PreEscaped<String>),
}

pub fn base(title: &str, head_elements: &[HeadElement], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Cashflow" }
                link rel="icon" type="image/png" href="/static/favicon-32x32.png" sizes="32x32";
                link href="/static/main.css" rel="stylesheet";

                script src="/static/htmx-2.0.8-min.js" {}
                script src="/static/htmx-ext-response-targets-2.0.4.js" {}

                style
                {
                    r#"
                    #indicator.htmx-indicator {
                        display: none;
                    }

                    #indicator.htmx-request .htmx-indicator {
                        display: inline;
                    }

                    #indicator.htmx-request.htmx-indicator {
                        display: inline;
                    }
                    "#
                }

                @for element in head_elements
                {
                    @match element
                    {
                        HeadElement::ScriptSource(text) => script { (text) }
                        HeadElement::ScriptLink(path) => script src=(path) {}
                        HeadElement::Style(text) => style { (text) }
                    }
                }
            }

            body
                hx-ext="response-targets"
                class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900 pb-[calc(5rem+env(safe-area-inset-bottom))] lg:pb-0"
            {
                (content)

                // Alert container for out-of-band swaps
                div
                    id="alert-container"
                    class="hidden w-full max-w-md px-4"
                    style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
                {}
            }
        }
    }
}

/// The centered single-form layout used by the log in and register pages.
pub fn log_in_register(form_title: &str, form: &Markup) -> Markup {
    html! {
        section class="bg-gray-50 dark:bg-gray-900"
        {
            div class="flex flex-col items-center justify-center px-6 py-8 mx-auto md:h-screen lg:py-0"
            {
                div
                    class="w-full bg-white rounded-lg shadow dark:border md:mt-0 sm:max-w-md xl:p-0 \
                        dark:bg-gray-800 dark:border-gray-700"
                {
                    div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                    {
                        h1
                            class="text-xl font-bold leading-tight tracking-tight text-gray-900 \
                                md:text-2xl dark:text-white"
                        {
                            (form_title)
                        }

                        (form)
                    }
                }
            }
        }
    }
}

pub fn password_input(password: &str, min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="password"
                class=(FORM_LABEL_STYLE)
            {
                "Password"
            }

            input
                type="password"
                name="password"
                id="password"
                placeholder="••••••••"
                value=(password)
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

pub fn loading_spinner() -> Markup {
    html! {
        svg
            class="animate-spin inline h-4 w-4 text-white"
            xmlns="http://www.w3.org/2000/svg"
            fill="none"
            viewBox="0 0 24 24"
        {
            circle class="opacity-25" cx="12" cy="12" r="10" stroke="currentColor" stroke-width="4" {}
            path
                class="opacity-75"
                fill="currentColor"
                d="M4 12a8 8 0 018-8V0C5.373 0 0 5.373 0 12h4zm2 5.291A7.962 7.962 0 014 12H0c0 3.042 1.135 5.824 3 7.938l3-2.647z" {}
        }
    }
}

pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    let mut formatted_string = if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "$0.00".to_owned()
    };

    // numfmt omits the last trailing zero, so we must add it ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    if formatted_string.as_bytes()[formatted_string.len() - 3] != b'.' {
        formatted_string = format!("{formatted_string}0");
    }

    formatted_string
}

/// A full-page error view with a large header, a description and a suggested fix.
pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
            {
                div class="mx-auto max-w-screen-sm text-center"
                {
                    h1
                        class="mb-4 text-7xl tracking-tight font-extrabold lg:text-9xl \
                            text-blue-600 dark:text-blue-500"
                    {
                        (header)
                    }

                    p class="mb-4 text-3xl tracking-tight font-bold text-gray-900 md:text-4xl dark:text-white"
                    {
                        (description)
                    }

                    p class="mb-4 text-lg font-light text-gray-500 dark:text-gray-400" { (fix) }

                    a
                        href=(crate::endpoints::DASHBOARD_VIEW)
                        class="inline-flex text-white bg-blue-600 hover:bg-blue-800 font-medium \
                            rounded-lg text-sm px-5 py-2.5 text-center my-4"
                    {
                        "Back to the dashboard"
                    }
                }
            }
        }
    );

    base(title, &[], &content)
}

/// A link with blue text for use in a <p> tag.
pub fn link(url: &str, text: &str) -> Markup {
    html! (
        a href=(url) tabindex="0" class=(LINK_STYLE) { (text) }
    )
}

#[cfg(test)]
mod format_currency_tests {
    use super::format_currency;

    #[test]
    fn formats_zero() {
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn formats_positive_amount_with_two_decimals() {
        assert_eq!(format_currency(12.3), "$12.30");
    }

    #[test]
    fn formats_negative_amount_with_leading_sign() {
        assert_eq!(format_currency(-45.99), "-$45.99");
    }

    #[test]
    fn formats_thousands_separator() {
        assert_eq!(format_currency(1234.5), "$1,234.50");
    }
}
