//! WebDriver-backed portal session.
//!
//! [`PortalSession`] drives a real Chrome through a WebDriver endpoint
//! (e.g. `chromedriver --port=9515`) and implements both session traits the
//! pipeline consumes. Everything portal-specific about clicking through the
//! disclaimer and filling the advanced search lives here.

use std::time::Duration;

use thirtyfour::ChromiumLikeCapabilities;
use thirtyfour::prelude::*;
use tracing::{debug, info, instrument, warn};

use datrack_listing::has_no_records;
use datrack_shared::{
    Advance, BrowserSession, DatrackError, DateRange, PortalConfig, Result, RunConfig,
    SearchOutcome, SearchSession,
};

/// Element locators on the ApplicationMaster pages.
mod locator {
    pub const AGREE_BUTTON: &str = "//input[@value='Agree']";
    pub const DA_TRACKING_LINK: &str = "//a[.//span[text()='DA Tracking']]";
    pub const ADVANCED_SEARCH_LINK: &str = "//a[.//span[text()='Advanced Search']]";
    pub const FROM_DATE_INPUT: &str = "//input[contains(@id,'ctl03_dateInput')]";
    pub const TO_DATE_INPUT: &str = "//input[contains(@id,'ctl05_dateInput')]";
    pub const SEARCH_BUTTON_ID: &str = "ctl00_cphContent_ctl00_btnSearch";
    pub const RESULTS_READY: &str =
        "//table[contains(@class,'rgMasterTable')] | //span[contains(text(),'No records')]";
    pub const NEXT_PAGE_BUTTON: &str = "//input[@class='rgPageNext'][@type='button']";
    pub const DETAIL_CONTENT: &str = "//div[contains(@class, 'makeTableRow_Content')]";
    pub const EXPAND_ALL: &str = "//img[contains(@src, 'HeadArrowDown.png')]";
}

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const DETAIL_WAIT: Duration = Duration::from_secs(10);
const KEY_DELAY: Duration = Duration::from_millis(50);
const FIELD_PAUSE: Duration = Duration::from_millis(300);

/// Chrome flags for the session.
pub fn chrome_args(headless: bool) -> Vec<&'static str> {
    let mut args = vec![
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
        "--window-size=1920,1080",
        "--start-maximized",
    ];
    if headless {
        args.insert(0, "--headless=new");
    }
    args
}

/// One browser, used for both the search listing and detail pages.
pub struct PortalSession {
    /// `None` once closed.
    driver: Option<WebDriver>,
    portal: PortalConfig,
    wait_timeout: Duration,
    settle: Duration,
}

impl PortalSession {
    /// Start a browser session on the configured WebDriver endpoint.
    #[instrument(skip_all, fields(webdriver = %config.browser.webdriver_url))]
    pub async fn connect(config: &RunConfig) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in chrome_args(config.browser.headless) {
            caps.add_arg(arg)
                .map_err(|e| DatrackError::setup("configure Chrome", e.to_string()))?;
        }

        let driver = WebDriver::new(config.browser.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| {
                DatrackError::setup(
                    "connect to WebDriver",
                    format!("{}: {e}", config.browser.webdriver_url),
                )
            })?;

        driver
            .set_page_load_timeout(Duration::from_secs(config.browser.page_load_timeout_secs))
            .await
            .map_err(|e| DatrackError::setup("configure Chrome", e.to_string()))?;

        info!(headless = config.browser.headless, "browser session started");

        Ok(Self {
            driver: Some(driver),
            portal: config.portal.clone(),
            wait_timeout: config.wait_timeout,
            settle: Duration::from_millis(config.browser.settle_ms),
        })
    }

    fn driver(&self) -> Result<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| DatrackError::Browser("session already closed".into()))
    }

    async fn settle(&self) {
        tokio::time::sleep(self.settle).await;
    }

    /// Wait for a clickable element matching `xpath`. The outer error means
    /// the session is closed, the inner one that the wait ran out.
    async fn clickable(&self, xpath: &str) -> Result<WebDriverResult<WebElement>> {
        Ok(self
            .driver()?
            .query(By::XPath(xpath))
            .wait(self.wait_timeout, POLL_INTERVAL)
            .and_clickable()
            .first()
            .await)
    }

    /// Click through JavaScript; the grid's controls ignore synthetic clicks
    /// when partly covered.
    async fn script_click(&self, element: &WebElement) -> Result<()> {
        self.driver()?
            .execute("arguments[0].click();", vec![element.to_json().map_err(browser_err)?])
            .await
            .map_err(browser_err)?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        self.driver()?.source().await.map_err(browser_err)
    }

    // -----------------------------------------------------------------------
    // Search setup steps
    // -----------------------------------------------------------------------

    async fn open_portal(&self) -> Result<()> {
        self.driver()?
            .goto(&self.portal.search_url)
            .await
            .map_err(|e| DatrackError::setup("open portal", e.to_string()))
    }

    /// The disclaimer is not always shown; its absence is fine.
    async fn accept_disclaimer(&self) -> Result<()> {
        match self.clickable(locator::AGREE_BUTTON).await? {
            Ok(button) => {
                if let Err(e) = button.click().await {
                    warn!(error = %e, "could not click Agree");
                }
                self.settle().await;
                debug!("disclaimer accepted");
            }
            Err(e) => debug!(error = %e, "no disclaimer shown"),
        }
        Ok(())
    }

    async fn open_da_tracking(&self) -> Result<()> {
        let step = |e: WebDriverError| DatrackError::setup("open DA Tracking", e.to_string());
        let link = self.clickable(locator::DA_TRACKING_LINK).await?.map_err(step)?;
        link.click().await.map_err(step)?;
        self.settle().await;
        Ok(())
    }

    async fn open_advanced_search(&self) -> Result<()> {
        let link = self
            .clickable(locator::ADVANCED_SEARCH_LINK)
            .await?
            .map_err(|e| DatrackError::setup("open Advanced Search", e.to_string()))?;
        self.script_click(&link)
            .await
            .map_err(|e| DatrackError::setup("open Advanced Search", e.to_string()))?;
        self.settle().await;
        Ok(())
    }

    async fn enter_dates(&self, range: &DateRange) -> Result<()> {
        let step = |e: WebDriverError| DatrackError::setup("set date range", e.to_string());
        let from = self.clickable(locator::FROM_DATE_INPUT).await?.map_err(step)?;
        let to = self.clickable(locator::TO_DATE_INPUT).await?.map_err(step)?;

        type_date(&from, &range.start_text()).await.map_err(step)?;
        type_date(&to, &range.end_text()).await.map_err(step)?;

        info!(from = %range.start_text(), to = %range.end_text(), "date range set");
        Ok(())
    }

    async fn submit_search(&self) -> Result<()> {
        let step = |e: WebDriverError| DatrackError::setup("run search", e.to_string());
        let driver = self.driver()?;

        let button = driver
            .query(By::Id(locator::SEARCH_BUTTON_ID))
            .wait(self.wait_timeout, POLL_INTERVAL)
            .and_clickable()
            .first()
            .await
            .map_err(step)?;
        driver
            .execute(
                "arguments[0].scrollIntoView(true);",
                vec![button.to_json().map_err(step)?],
            )
            .await
            .map_err(step)?;
        tokio::time::sleep(FIELD_PAUSE).await;
        button.click().await.map_err(step)?;

        driver
            .query(By::XPath(locator::RESULTS_READY))
            .wait(self.wait_timeout, POLL_INTERVAL)
            .first()
            .await
            .map_err(step)?;
        self.settle().await;
        Ok(())
    }
}

/// Type a date one key at a time; the masked input drops pasted text.
async fn type_date(input: &WebElement, date: &str) -> WebDriverResult<()> {
    input.click().await?;
    tokio::time::sleep(FIELD_PAUSE).await;
    input.clear().await?;
    tokio::time::sleep(FIELD_PAUSE).await;
    for ch in date.chars() {
        input.send_keys(ch.to_string()).await?;
        tokio::time::sleep(KEY_DELAY).await;
    }
    input.send_keys(Key::Tab).await?;
    tokio::time::sleep(FIELD_PAUSE).await;
    Ok(())
}

fn browser_err(e: WebDriverError) -> DatrackError {
    DatrackError::Browser(e.to_string())
}

impl SearchSession for PortalSession {
    #[instrument(skip_all)]
    async fn search(&mut self, range: &DateRange) -> Result<SearchOutcome> {
        self.open_portal().await?;
        self.accept_disclaimer().await?;
        self.open_da_tracking().await?;
        self.open_advanced_search().await?;
        self.enter_dates(range).await?;
        self.submit_search().await?;

        let document = self.page_source().await?;
        if has_no_records(&document) {
            info!("search returned no records");
            return Ok(SearchOutcome::NoRecords);
        }
        Ok(SearchOutcome::Results { document })
    }

    async fn results_document(&mut self) -> Result<String> {
        self.page_source().await
    }

    async fn next_page(&mut self) -> Result<Advance> {
        let buttons = self
            .driver()?
            .find_all(By::XPath(locator::NEXT_PAGE_BUTTON))
            .await
            .map_err(browser_err)?;

        let Some(button) = buttons.into_iter().next() else {
            return Ok(Advance::NoNextPage);
        };

        self.script_click(&button).await?;
        self.settle().await;
        Ok(Advance::Advanced)
    }
}

impl BrowserSession for PortalSession {
    async fn navigate(&mut self, url: &str) -> Result<String> {
        let driver = self.driver()?;
        driver.goto(url).await.map_err(browser_err)?;

        // A missing content block is left for the extractor to judge.
        if let Err(e) = driver
            .query(By::XPath(locator::DETAIL_CONTENT))
            .wait(DETAIL_WAIT, POLL_INTERVAL)
            .first()
            .await
        {
            debug!(url, error = %e, "detail content did not appear");
        }

        self.page_source().await
    }

    async fn current_document(&mut self) -> Result<String> {
        self.page_source().await
    }

    async fn current_url(&mut self) -> Result<String> {
        let url = self.driver()?.current_url().await.map_err(browser_err)?;
        Ok(url.to_string())
    }

    async fn expand_all(&mut self) -> Result<bool> {
        let arrows = self
            .driver()?
            .find_all(By::XPath(locator::EXPAND_ALL))
            .await
            .map_err(browser_err)?;

        let Some(arrow) = arrows.into_iter().next() else {
            return Ok(false);
        };

        self.script_click(&arrow).await?;
        self.settle().await;
        Ok(true)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await.map_err(browser_err)?;
            info!("browser session closed");
        }
        Ok(())
    }
}

impl Drop for PortalSession {
    fn drop(&mut self) {
        if self.driver.is_some() {
            warn!("browser session dropped without close; relying on WebDriver drop to end it");
        }
    }
}
